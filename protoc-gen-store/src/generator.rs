//! Emission of store-backed wrappers for the services of each file.

use dart_model::{Bloc, DartFile, Import, Operation, Param};

use crate::descriptor::{DescriptorTree, NodeId};
use crate::error::GenerateError;
use crate::imports::{ImportSet, output_path, relative_prefix};
use crate::name::NameResolver;
use crate::options::GeneratorOptions;
use crate::signature::MethodSignature;
use crate::types::TypeMapper;

/// Imports every wrapper file starts with: RPC runtime, store and result
/// wrappers, 64-bit integers.
pub const BASELINE_IMPORTS: [&str; 3] = [
    "package:grpc/grpc.dart",
    "package:sane/sane.dart",
    "package:fixnum/fixnum.dart",
];

/// A generated output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub content: String,
}

/// Walks services and methods and renders one wrapper file per input file
#[derive(Debug, Clone, Default)]
pub struct Generator {
    options: GeneratorOptions,
}

impl Generator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Generates an artifact for every file that declares a service
    pub fn generate(&self, tree: &DescriptorTree) -> Result<Vec<Artifact>, GenerateError> {
        let mut artifacts = Vec::new();
        for file in tree.files() {
            if let Some(artifact) = self.generate_file(tree, file)? {
                artifacts.push(artifact);
            }
        }
        Ok(artifacts)
    }

    /// Renders the wrapper for one file; `None` when it has no services
    pub fn generate_file(
        &self,
        tree: &DescriptorTree,
        file: NodeId,
    ) -> Result<Option<Artifact>, GenerateError> {
        let Some(info) = tree.file_info(file) else {
            return Ok(None);
        };
        if tree.services(file).next().is_none() {
            return Ok(None);
        }

        let document = self.build_document(tree, file)?;
        let name = output_path(&info.path, &self.options.artifact_suffix);

        tracing::debug!(
            artifact = %name,
            services = document.blocs.len(),
            imports = document.imports.len(),
            "generated store wrapper"
        );

        Ok(Some(Artifact {
            name,
            content: document.to_string(),
        }))
    }

    /// Builds the document model for one file
    pub fn build_document(
        &self,
        tree: &DescriptorTree,
        file: NodeId,
    ) -> Result<DartFile, GenerateError> {
        let mut document = DartFile::new(tree.fully_qualified_name(file));
        let mut imports = ImportSet::new(file);

        for service in tree.services(file) {
            document.add_bloc(self.build_bloc(tree, service, &mut imports)?);
        }

        let path = tree
            .file_info(file)
            .map(|info| info.path.as_str())
            .unwrap_or_default();
        let prefix = relative_prefix(&output_path(path, &self.options.artifact_suffix));

        for uri in BASELINE_IMPORTS {
            document.add_import(Import::new(uri));
        }
        for dependency in imports.files(tree) {
            let target = output_path(dependency, &self.options.message_suffix);
            document.add_import(Import::new(format!("{prefix}{target}")));
        }
        let stub = output_path(path, &self.options.stub_suffix);
        document.add_import(Import::new(format!("{prefix}{stub}")));

        Ok(document)
    }

    /// One wrapper per service; records the external types its methods use
    pub fn build_bloc(
        &self,
        tree: &DescriptorTree,
        service: NodeId,
        imports: &mut ImportSet,
    ) -> Result<Bloc, GenerateError> {
        let names = NameResolver::new(tree);
        let mut bloc = Bloc::new(names.bloc_name(service), names.client_name(service));

        for method in tree.methods(service) {
            if let Some(operation) = self.build_operation(tree, method, imports)? {
                bloc.add_operation(operation);
            }
        }

        Ok(bloc)
    }

    /// The operation for a unary method. Streaming methods yield `None`.
    pub fn build_operation(
        &self,
        tree: &DescriptorTree,
        method: NodeId,
        imports: &mut ImportSet,
    ) -> Result<Option<Operation>, GenerateError> {
        let Some(info) = tree.method(method) else {
            return Ok(None);
        };
        if info.is_streaming() {
            tracing::debug!(
                method = %tree.fully_qualified_name(method),
                client_streaming = info.client_streaming,
                server_streaming = info.server_streaming,
                "skipping streaming method"
            );
            return Ok(None);
        }

        imports.collect_method(tree, method);

        let signature = MethodSignature::for_method(tree, method)?;
        let required = signature.required_fields();

        let names = NameResolver::new(tree);
        let types = TypeMapper::new(names);

        let params = tree
            .fields(info.input)
            .map(|field| Param {
                name: names.resolve(field),
                ty: types.map_type(field),
                required: required.contains(tree.node(field).name()),
            })
            .collect();

        Ok(Some(Operation {
            name: names.resolve(method),
            scope: tree.fully_qualified_name(method),
            request: names.resolve(info.input),
            response: names.resolve(info.output),
            params,
        }))
    }
}
