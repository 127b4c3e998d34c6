//! Per-file accumulation of the externally defined types a wrapper uses.

use std::collections::{BTreeMap, BTreeSet};

use crate::descriptor::{DescriptorTree, NodeId};

/// Types referenced from other files, keyed by fully-qualified name.
///
/// Created empty for each output file and dropped once that file is emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSet {
    current: NodeId,
    types: BTreeMap<String, NodeId>,
}

impl ImportSet {
    /// Creates an accumulator for the wrapper generated from `file`
    pub fn new(file: NodeId) -> Self {
        Self {
            current: file,
            types: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Fully-qualified names of the recorded types
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Records the external types a method needs: its own input and output,
    /// and everything reachable from the request message's fields.
    pub fn collect_method(&mut self, tree: &DescriptorTree, method: NodeId) {
        let Some(info) = tree.method(method) else {
            return;
        };
        self.insert(tree, info.input);
        self.insert(tree, info.output);

        let mut visited = BTreeSet::new();
        self.collect_message(tree, info.input, &mut visited);
    }

    fn collect_message(
        &mut self,
        tree: &DescriptorTree,
        message: NodeId,
        visited: &mut BTreeSet<NodeId>,
    ) {
        if !visited.insert(message) || self.is_external(tree, message) {
            return;
        }

        // map entries are nested messages
        for nested in tree.messages(message) {
            self.collect_message(tree, nested, visited);
        }

        for field in tree.fields(message) {
            let Some(target) = tree.field(field).and_then(|f| f.type_ref()) else {
                continue;
            };
            if self.is_external(tree, target) {
                self.insert(tree, target);
            } else if tree.node(target).is_message() {
                self.collect_message(tree, target, visited);
            }
        }
    }

    /// Records `ty` if it is declared outside the current file
    pub fn insert(&mut self, tree: &DescriptorTree, ty: NodeId) {
        if !self.is_external(tree, ty) {
            return;
        }
        if let Some(file) = tree.file_of(ty) {
            self.types.insert(tree.fully_qualified_name(ty), file);
        }
    }

    fn is_external(&self, tree: &DescriptorTree, ty: NodeId) -> bool {
        tree.file_of(ty) != Some(self.current)
    }

    /// Distinct files declaring the recorded types, ordered by path
    pub fn files<'t>(&self, tree: &'t DescriptorTree) -> BTreeSet<&'t str> {
        self.types
            .values()
            .filter_map(|file| tree.file_info(*file))
            .map(|info| info.path.as_str())
            .collect()
    }
}

/// Replaces the extension of the last path segment with `suffix`
pub fn output_path(path: &str, suffix: &str) -> String {
    let base_start = path.rfind('/').map_or(0, |i| i + 1);
    let stem = match path[base_start..].rfind('.') {
        Some(dot) => &path[..base_start + dot],
        None => path,
    };
    format!("{stem}{suffix}")
}

/// `../` once per directory between `path` and the output root
pub fn relative_prefix(path: &str) -> String {
    "../".repeat(path.split('/').count() - 1)
}
