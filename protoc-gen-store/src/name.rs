//! Dart identifiers for descriptor entities.
//!
//! Names follow the conventions of the Dart protobuf plugin so generated
//! wrappers can refer to its message, enum and client classes directly.

use heck::{ToLowerCamelCase, ToUpperCamelCase};

use crate::descriptor::{DescriptorTree, NodeId, NodeKind};

/// Identifiers that collide with members every generated message carries,
/// mapped to their disambiguated form.
pub const PROTECTED_NAMES: &[(&str, &str)] = &[
    ("Reset", "Reset_"),
    ("String", "String_"),
    ("ProtoMessage", "ProtoMessage_"),
    ("Marshal", "Marshal_"),
    ("Unmarshal", "Unmarshal_"),
    ("ExtensionRangeArray", "ExtensionRangeArray_"),
    ("ExtensionMap", "ExtensionMap_"),
    ("Descriptor", "Descriptor_"),
    ("reset", "reset_"),
    ("string", "string_"),
    ("protoMessage", "protoMessage_"),
    ("marshal", "marshal_"),
    ("unmarshal", "unmarshal_"),
    ("extensionRangeArray", "extensionRangeArray_"),
    ("extensionMap", "extensionMap_"),
    ("descriptor", "descriptor_"),
];

/// Resolves canonical identifiers against one descriptor tree
#[derive(Debug, Clone, Copy)]
pub struct NameResolver<'a> {
    tree: &'a DescriptorTree,
}

impl<'a> NameResolver<'a> {
    pub fn new(tree: &'a DescriptorTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'a DescriptorTree {
        self.tree
    }

    /// Canonical identifier of any entity
    pub fn resolve(&self, id: NodeId) -> String {
        let node = self.tree.node(id);
        match node.kind() {
            // the package name for this file
            NodeKind::File(_) | NodeKind::Package => String::new(),
            // nested types are flattened into their parent's name
            NodeKind::Message(_) | NodeKind::Enum => match node.parent() {
                Some(parent) if self.tree.node(parent).is_message() => {
                    join_child(&self.resolve(parent), node.name())
                }
                _ => node.name().to_upper_camel_case(),
            },
            NodeKind::Field(_) => replace_protected(node.name().to_lower_camel_case()),
            NodeKind::OneOf => replace_protected(node.name().to_upper_camel_case()),
            NodeKind::EnumValue { .. } => {
                let Some(en) = node.parent() else {
                    unreachable!("enum value `{}` has no enum", node.name());
                };
                match self.tree.node(en).parent() {
                    Some(scope) if !self.tree.node(scope).is_file() => {
                        join_names(&self.resolve(scope), node.name())
                    }
                    _ => join_names(&self.resolve(en), node.name()),
                }
            }
            NodeKind::Service => self.server_name(id),
            NodeKind::Method(_) => node.name().to_lower_camel_case(),
        }
    }

    /// Name of the oneof case class for `field`.
    ///
    /// When the name collides with a type nested in the same message a single
    /// underscore is appended. The result is not re-checked.
    pub fn oneof_option(&self, field: NodeId) -> String {
        let Some(message) = self.tree.node(field).parent() else {
            unreachable!("field has no message");
        };
        let name = join_names(&self.resolve(message), &self.resolve(field));

        let collides = self
            .tree
            .messages(message)
            .chain(self.tree.enums(message))
            .any(|nested| self.resolve(nested) == name);

        if collides { name + "_" } else { name }
    }

    pub fn server_name(&self, service: NodeId) -> String {
        format!("{}Server", self.tree.node(service).name().to_upper_camel_case())
    }

    pub fn client_name(&self, service: NodeId) -> String {
        format!("{}Client", self.tree.node(service).name().to_upper_camel_case())
    }

    /// Name of the generated store wrapper for a service
    pub fn bloc_name(&self, service: NodeId) -> String {
        format!("{}Bloc", self.tree.node(service).name().to_upper_camel_case())
    }

    pub fn server_stream_name(&self, method: NodeId) -> String {
        let node = self.tree.node(method);
        let service = node
            .parent()
            .map(|s| self.tree.node(s).name().to_upper_camel_case())
            .unwrap_or_default();
        join_names(&service, &node.name().to_upper_camel_case()) + "Server"
    }
}

fn replace_protected(name: String) -> String {
    match PROTECTED_NAMES.iter().find(|(reserved, _)| *reserved == name) {
        Some((_, replacement)) => replacement.to_string(),
        None => name,
    }
}

fn join_child(parent: &str, child: &str) -> String {
    match child.chars().next() {
        Some(c) if c.is_alphabetic() && c.is_lowercase() => {
            format!("{parent}{}", child.to_upper_camel_case())
        }
        _ => join_names(parent, &child.to_upper_camel_case()),
    }
}

fn join_names(a: &str, b: &str) -> String {
    format!("{a}_{b}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DescriptorBuilder, FieldInfo, MethodInfo, ProtoType};
    use proptest::prelude::*;

    struct Fixture {
        tree: DescriptorTree,
        file: NodeId,
        outer: NodeId,
        inner: NodeId,
        lower_inner: NodeId,
        color: NodeId,
        red: NodeId,
        shape: NodeId,
        kind: NodeId,
        round: NodeId,
        user_id: NodeId,
        choice: NodeId,
        greeter: NodeId,
        say_hello: NodeId,
    }

    fn fixture() -> Fixture {
        let mut b = DescriptorBuilder::new();
        let file = b.file("demo/names.proto", "demo");
        let outer = b.message(file, "Outer");
        let inner = b.message(outer, "Inner");
        let lower_inner = b.message(outer, "inner");
        let color = b.enumeration(file, "Color");
        let red = b.enum_value(color, "RED", 0);
        let shape = b.message(file, "Shape");
        let kind = b.enumeration(shape, "Kind");
        let round = b.enum_value(kind, "ROUND", 0);
        let choice = b.oneof(outer, "choice");
        let user_id = b.field(outer, "user_id", FieldInfo::scalar(1, ProtoType::Int64).in_oneof(choice));
        let greeter = b.service(file, "greeter");
        let say_hello = b.method(greeter, "SayHello", MethodInfo::unary(outer, outer));

        Fixture {
            tree: b.build(),
            file,
            outer,
            inner,
            lower_inner,
            color,
            red,
            shape,
            kind,
            round,
            user_id,
            choice,
            greeter,
            say_hello,
        }
    }

    #[test]
    fn test_file_and_package_are_empty() {
        let f = fixture();
        let names = NameResolver::new(&f.tree);
        let package = f.tree.file_info(f.file).map(|i| i.package).expect("package");

        assert_eq!(names.resolve(f.file), "");
        assert_eq!(names.resolve(package), "");
    }

    #[test]
    fn test_nested_type_names() {
        let f = fixture();
        let names = NameResolver::new(&f.tree);

        assert_eq!(names.resolve(f.outer), "Outer");
        assert_eq!(names.resolve(f.inner), "Outer_Inner");
        assert_eq!(names.resolve(f.lower_inner), "OuterInner");
        assert_eq!(names.resolve(f.kind), "Shape_Kind");
    }

    #[test]
    fn test_enum_value_names() {
        let f = fixture();
        let names = NameResolver::new(&f.tree);

        assert_eq!(names.resolve(f.color), "Color");
        assert_eq!(names.resolve(f.red), "Color_RED");
        // nested enum values are scoped by the enclosing message
        assert_eq!(names.resolve(f.round), "Shape_ROUND");
        assert_eq!(names.resolve(f.shape), "Shape");
    }

    #[test]
    fn test_member_names() {
        let f = fixture();
        let names = NameResolver::new(&f.tree);

        assert_eq!(names.resolve(f.user_id), "userId");
        assert_eq!(names.resolve(f.choice), "Choice");
        assert_eq!(names.resolve(f.greeter), "GreeterServer");
        assert_eq!(names.resolve(f.say_hello), "sayHello");
    }

    #[test]
    fn test_service_derived_names() {
        let f = fixture();
        let names = NameResolver::new(&f.tree);

        assert_eq!(names.client_name(f.greeter), "GreeterClient");
        assert_eq!(names.bloc_name(f.greeter), "GreeterBloc");
        assert_eq!(names.server_stream_name(f.say_hello), "Greeter_SayHelloServer");
    }

    #[test]
    fn test_oneof_option() {
        let f = fixture();
        let names = NameResolver::new(&f.tree);

        assert_eq!(names.oneof_option(f.user_id), "Outer_userId");
    }

    #[test]
    fn test_oneof_option_collision() {
        let mut b = DescriptorBuilder::new();
        let file = b.file("c.proto", "c");
        let outer = b.message(file, "Outer");
        let nested = b.message(outer, "_1abc");
        let field = b.field(outer, "_1abc", FieldInfo::scalar(1, ProtoType::Bool));
        let tree = b.build();
        let names = NameResolver::new(&tree);

        assert_eq!(names.resolve(nested), "Outer_1abc");
        assert_eq!(names.oneof_option(field), "Outer_1abc_");
    }

    #[test]
    fn test_protected_field_names() {
        for (reserved, replacement) in PROTECTED_NAMES {
            let mut b = DescriptorBuilder::new();
            let file = b.file("p.proto", "p");
            let msg = b.message(file, "Holder");
            let field = b.field(msg, reserved, FieldInfo::scalar(1, ProtoType::Bool));
            let oneof = b.oneof(msg, reserved);
            let tree = b.build();
            let names = NameResolver::new(&tree);

            let (field_name, oneof_name) = (names.resolve(field), names.resolve(oneof));
            if reserved.starts_with(char::is_lowercase) {
                assert_eq!(&field_name, replacement, "field `{reserved}`");
            } else {
                assert_eq!(&oneof_name, replacement, "oneof `{reserved}`");
            }
        }
    }

    #[test]
    fn test_unprotected_names_pass_through() {
        assert_eq!(replace_protected("resetCount".to_string()), "resetCount");
        assert_eq!(replace_protected("Strings".to_string()), "Strings");
    }

    proptest! {
        #[test]
        fn prop_resolution_is_stable(outer in "[A-Z][a-z]{1,8}", inner in "[a-zA-Z][a-z_]{0,8}") {
            let mut b = DescriptorBuilder::new();
            let file = b.file("x.proto", "x");
            let o = b.message(file, &outer);
            let i = b.message(o, &inner);
            let field = b.field(i, &inner, FieldInfo::scalar(1, ProtoType::String));
            let tree = b.build();
            let names = NameResolver::new(&tree);

            prop_assert_eq!(names.resolve(i), names.resolve(i));
            prop_assert_eq!(names.resolve(field), names.resolve(field));
            prop_assert!(names.resolve(i).starts_with(&names.resolve(o)));
        }
    }
}
