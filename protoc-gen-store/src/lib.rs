//! Store-Backed Dart Client Generation from Protobuf Services
//!
//! This library generates, for every `.proto` file that declares services, a
//! Dart file holding one wrapper class ("bloc") per service. Each unary RPC
//! becomes an `async` operation that publishes its loading, result and error
//! state into a reactive key-value store.
//!
//! ## Architecture
//!
//! The library is structured in three layers:
//!
//! 1. **Descriptor tree** (`descriptor` module): a read-only arena of files,
//!    messages, enums, fields, services and methods with parent links. Schema
//!    loaders assemble it through [`DescriptorBuilder`].
//!
//! 2. **Resolution** (`name`, `types`, `imports`, `signature` modules): Dart
//!    identifiers for every entity, Dart types for every field, the external
//!    files a wrapper depends on, and the required-parameter list declared on
//!    each method.
//!
//! 3. **Emission** (`generator` module): turns a file's services into the
//!    `dart-model` document and renders it. An optional formatter
//!    (`format` module) post-processes the text.
//!
//! ## Usage
//!
//! ```rust
//! use protoc_gen_store::{
//!     DescriptorBuilder, FieldInfo, Generator, MethodInfo, MethodSignature, ProtoType,
//! };
//! use prost::Message;
//!
//! let mut b = DescriptorBuilder::new();
//! let file = b.file("helloworld.proto", "helloworld");
//! let request = b.message(file, "HelloRequest");
//! b.field(request, "name", FieldInfo::scalar(1, ProtoType::String));
//! let reply = b.message(file, "HelloReply");
//! b.field(reply, "message", FieldInfo::scalar(1, ProtoType::String));
//! let greeter = b.service(file, "Greeter");
//! let required = MethodSignature { required: "name".to_string() }.encode_to_vec();
//! b.method(greeter, "SayHello", MethodInfo::unary(request, reply).with_signature(required));
//!
//! let artifacts = Generator::default().generate(&b.build())?;
//! assert_eq!(artifacts[0].name, "helloworld.pbstore.dart");
//! assert!(artifacts[0].content.contains("class GreeterBloc {"));
//! # Ok::<(), protoc_gen_store::GenerateError>(())
//! ```
//!
//! ## Generated Operations
//!
//! For `rpc SayHello(HelloRequest) returns (HelloReply)` with `name` declared
//! required, the wrapper gains:
//!
//! ```dart
//! Future<Result<HelloReply>> sayHello({
//!   required String name,
//! }) async {
//!   final req = HelloRequest(name: name);
//!   final baseRef = 'sayHello(${req.hashCode})';
//!   final loadingRef = '$baseRef:loading';
//!   final errorRef = '$baseRef:error';
//!   store.publishRecord(loadingRef, true);
//!   store.publishRecord<GrpcError?>(errorRef, null);
//!   store.notify();
//!   try {
//!     final res = await api.sayHello(req);
//!     store.publishRecord<HelloReply>(baseRef, res);
//!     return Result(res, null);
//!   } on GrpcError catch (err) {
//!     store.publishRecord<GrpcError>(errorRef, err);
//!     return Result(null, err);
//!   } finally {
//!     store.publishRecord(loadingRef, false);
//!     store.notify();
//!   }
//! }
//! ```
//!
//! Insertion points (`// @@protoc_insertion_point(<phase>:<name>)`) mark where
//! hand-written code is preserved by regeneration tooling.
//!
//! ## Conventions
//!
//! - Streaming methods are skipped
//! - Request fields listed in the method-signature extension become `required`
//!   parameters; all others are nullable (collections default to empty)
//! - Nested types are flattened into `Outer_Inner`

pub mod descriptor;
pub mod error;
pub mod format;
pub mod generator;
pub mod imports;
pub mod name;
pub mod options;
pub mod signature;
pub mod types;

pub use dart_model::{
    Bloc, DartFile, DartType, Import, InsertionPoint, Operation, Param, Phase, ReferenceKey,
    Scalar,
};
pub use descriptor::{
    DescriptorBuilder, DescriptorTree, FieldInfo, FieldType, Label, MethodInfo, NodeId, NodeKind,
    ProtoType,
};
pub use error::{FormatError, GenerateError, OptionsError};
pub use format::{DartFormat, PostProcessor, post_process};
pub use generator::{Artifact, Generator};
pub use name::NameResolver;
pub use options::GeneratorOptions;
pub use signature::MethodSignature;
pub use types::TypeMapper;

/// Generates every artifact for `tree` under the protoc-style `parameter`
/// string and, when enabled, formats them
pub fn run(tree: &DescriptorTree, parameter: Option<&str>) -> Result<Vec<Artifact>, GenerateError> {
    let options = GeneratorOptions::parse(parameter)?;
    let formatter = DartFormat::with_command(options.formatter.clone());
    let format = options.format;

    let artifacts = Generator::new(options).generate(tree)?;
    if !format {
        return Ok(artifacts);
    }

    Ok(post_process(artifacts, &[&formatter]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_without_formatting() {
        let mut b = DescriptorBuilder::new();
        let file = b.file("ping.proto", "ping");
        let msg = b.message(file, "Ping");
        let svc = b.service(file, "Pinger");
        b.method(svc, "Ping", MethodInfo::unary(msg, msg));
        let tree = b.build();

        let artifacts = run(&tree, Some("format=false")).unwrap();

        assert_eq!(artifacts, Generator::default().generate(&tree).unwrap());
    }

    #[test]
    fn test_run_keeps_output_when_formatter_missing() {
        let mut b = DescriptorBuilder::new();
        let file = b.file("ping.proto", "ping");
        let msg = b.message(file, "Ping");
        let svc = b.service(file, "Pinger");
        b.method(svc, "Ping", MethodInfo::unary(msg, msg));
        let tree = b.build();

        let artifacts = run(&tree, Some("formatter=protoc-gen-store-no-such-formatter")).unwrap();

        assert_eq!(artifacts, Generator::default().generate(&tree).unwrap());
    }

    #[test]
    fn test_run_rejects_bad_parameter() {
        let tree = DescriptorBuilder::new().build();

        let err = run(&tree, Some("format=maybe")).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Options(OptionsError::InvalidValue { ref key, .. }) if key == "format"
        ));
    }
}
