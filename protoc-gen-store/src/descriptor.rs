//! Read-only descriptor tree handed to the generator by a schema loader.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Every node except
//! files and packages has exactly one parent; the generator only ever reads
//! the tree.

use heck::ToUpperCamelCase;

/// Position of a node in a [`DescriptorTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A descriptor tree for one generation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorTree {
    nodes: Vec<Node>,
    files: Vec<NodeId>,
}

/// A single descriptor entity
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Package,
    File(FileInfo),
    Message(MessageInfo),
    Enum,
    EnumValue { number: i32 },
    Field(FieldInfo),
    OneOf,
    Service,
    Method(MethodInfo),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    /// Path of the `.proto` file, relative to the include root.
    pub path: String,
    pub package: NodeId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageInfo {
    /// Synthesized `<Name>Entry` message backing a map field.
    pub map_entry: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub number: i32,
    pub label: Label,
    pub ty: FieldType,
    /// Declared with the `optional` keyword.
    pub explicit_presence: bool,
    pub oneof: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub input: NodeId,
    pub output: NodeId,
    pub client_streaming: bool,
    pub server_streaming: bool,
    /// Raw payload of the method-signature extension, when declared.
    pub signature: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Optional,
    Required,
    Repeated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ProtoType),
    Message(NodeId),
    Enum(NodeId),
}

/// Scalar wire types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtoType {
    Double,
    Float,
    Int64,
    UInt64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Bytes,
    UInt32,
    SFixed32,
    SFixed64,
    SInt32,
    SInt64,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_message(&self) -> bool {
        matches!(self.kind, NodeKind::Message(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File(_))
    }
}

impl FieldInfo {
    pub fn new(number: i32, ty: FieldType) -> Self {
        Self {
            number,
            label: Label::Optional,
            ty,
            explicit_presence: false,
            oneof: None,
        }
    }

    pub fn scalar(number: i32, ty: ProtoType) -> Self {
        Self::new(number, FieldType::Scalar(ty))
    }

    pub fn message(number: i32, message: NodeId) -> Self {
        Self::new(number, FieldType::Message(message))
    }

    pub fn enumeration(number: i32, en: NodeId) -> Self {
        Self::new(number, FieldType::Enum(en))
    }

    pub fn repeated(mut self) -> Self {
        self.label = Label::Repeated;
        self
    }

    /// Marks the field as declared with the `optional` keyword
    pub fn optional(mut self) -> Self {
        self.explicit_presence = true;
        self
    }

    pub fn in_oneof(mut self, oneof: NodeId) -> Self {
        self.oneof = Some(oneof);
        self
    }

    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }

    /// The referenced message or enum, if any
    pub fn type_ref(&self) -> Option<NodeId> {
        match self.ty {
            FieldType::Message(id) | FieldType::Enum(id) => Some(id),
            FieldType::Scalar(_) => None,
        }
    }
}

impl MethodInfo {
    pub fn unary(input: NodeId, output: NodeId) -> Self {
        Self {
            input,
            output,
            client_streaming: false,
            server_streaming: false,
            signature: None,
        }
    }

    pub fn with_signature(mut self, payload: Vec<u8>) -> Self {
        self.signature = Some(payload);
        self
    }

    pub fn is_streaming(&self) -> bool {
        self.client_streaming || self.server_streaming
    }
}

impl DescriptorTree {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Files in the order the loader registered them
    pub fn files(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.files.iter().copied()
    }

    fn children_where(
        &self,
        parent: NodeId,
        pred: fn(&NodeKind) -> bool,
    ) -> impl Iterator<Item = NodeId> + '_ {
        self.node(parent)
            .children
            .iter()
            .copied()
            .filter(move |id| pred(&self.node(*id).kind))
    }

    pub fn messages(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children_where(parent, |k| matches!(k, NodeKind::Message(_)))
    }

    pub fn enums(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children_where(parent, |k| matches!(k, NodeKind::Enum))
    }

    pub fn enum_values(&self, en: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children_where(en, |k| matches!(k, NodeKind::EnumValue { .. }))
    }

    pub fn fields(&self, message: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children_where(message, |k| matches!(k, NodeKind::Field(_)))
    }

    pub fn oneofs(&self, message: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children_where(message, |k| matches!(k, NodeKind::OneOf))
    }

    pub fn services(&self, file: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children_where(file, |k| matches!(k, NodeKind::Service))
    }

    pub fn methods(&self, service: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children_where(service, |k| matches!(k, NodeKind::Method(_)))
    }

    pub fn field(&self, id: NodeId) -> Option<&FieldInfo> {
        match &self.node(id).kind {
            NodeKind::Field(info) => Some(info),
            _ => None,
        }
    }

    pub fn method(&self, id: NodeId) -> Option<&MethodInfo> {
        match &self.node(id).kind {
            NodeKind::Method(info) => Some(info),
            _ => None,
        }
    }

    pub fn file_info(&self, id: NodeId) -> Option<&FileInfo> {
        match &self.node(id).kind {
            NodeKind::File(info) => Some(info),
            _ => None,
        }
    }

    /// The file declaring `id`. Packages have no file.
    pub fn file_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            let node = self.node(current);
            if node.is_file() {
                return Some(current);
            }
            current = node.parent?;
        }
    }

    /// Key and value fields of a map field's synthesized entry message
    pub fn map_entry(&self, field: NodeId) -> Option<(NodeId, NodeId)> {
        let info = self.field(field)?;
        let FieldType::Message(entry) = info.ty else {
            return None;
        };
        if !info.is_repeated() {
            return None;
        }
        match &self.node(entry).kind {
            NodeKind::Message(MessageInfo { map_entry: true }) => {}
            _ => return None,
        }

        let mut key = None;
        let mut value = None;
        for id in self.fields(entry) {
            match self.field(id).map(|f| f.number) {
                Some(1) => key = Some(id),
                Some(2) => value = Some(id),
                _ => {}
            }
        }
        Some((key?, value?))
    }

    /// Dotted name from the package root, with a leading dot (`.pkg.Outer.Inner`)
    pub fn fully_qualified_name(&self, id: NodeId) -> String {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Package if node.name.is_empty() => String::new(),
            NodeKind::Package => format!(".{}", node.name),
            NodeKind::File(info) => self.fully_qualified_name(info.package),
            _ => {
                let scope = node
                    .parent
                    .map(|p| self.fully_qualified_name(p))
                    .unwrap_or_default();
                format!("{scope}.{}", node.name)
            }
        }
    }

    fn push(&mut self, name: &str, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            kind,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }
}

/// Incrementally assembles a [`DescriptorTree`]
#[derive(Debug, Default)]
pub struct DescriptorBuilder {
    tree: DescriptorTree,
}

impl DescriptorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a file, creating its package node on first use
    pub fn file(&mut self, path: &str, package: &str) -> NodeId {
        let existing = self.tree.nodes.iter().position(|n| {
            matches!(n.kind, NodeKind::Package) && n.name == package
        });
        let package = match existing {
            Some(index) => NodeId(index),
            None => self.tree.push(package, None, NodeKind::Package),
        };

        let file = self.tree.push(
            path.rsplit('/').next().unwrap_or(path),
            None,
            NodeKind::File(FileInfo {
                path: path.to_string(),
                package,
            }),
        );
        self.tree.files.push(file);
        file
    }

    /// Adds a message to a file or, nested, to another message
    pub fn message(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.tree
            .push(name, Some(parent), NodeKind::Message(MessageInfo::default()))
    }

    pub fn enumeration(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.tree.push(name, Some(parent), NodeKind::Enum)
    }

    pub fn enum_value(&mut self, en: NodeId, name: &str, number: i32) -> NodeId {
        self.tree
            .push(name, Some(en), NodeKind::EnumValue { number })
    }

    pub fn field(&mut self, message: NodeId, name: &str, info: FieldInfo) -> NodeId {
        self.tree.push(name, Some(message), NodeKind::Field(info))
    }

    pub fn oneof(&mut self, message: NodeId, name: &str) -> NodeId {
        self.tree.push(name, Some(message), NodeKind::OneOf)
    }

    /// Adds a map field, synthesizing its `<Name>Entry` message the way protoc does
    pub fn map_field(
        &mut self,
        message: NodeId,
        name: &str,
        number: i32,
        key: ProtoType,
        value: FieldType,
    ) -> NodeId {
        let entry_name = format!("{}Entry", name.to_upper_camel_case());
        let entry = self.tree.push(
            &entry_name,
            Some(message),
            NodeKind::Message(MessageInfo { map_entry: true }),
        );
        self.field(entry, "key", FieldInfo::scalar(1, key));
        self.field(entry, "value", FieldInfo::new(2, value));

        self.field(message, name, FieldInfo::message(number, entry).repeated())
    }

    pub fn service(&mut self, file: NodeId, name: &str) -> NodeId {
        self.tree.push(name, Some(file), NodeKind::Service)
    }

    pub fn method(&mut self, service: NodeId, name: &str, info: MethodInfo) -> NodeId {
        self.tree.push(name, Some(service), NodeKind::Method(info))
    }

    pub fn build(self) -> DescriptorTree {
        self.tree
    }
}
