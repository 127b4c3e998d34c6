//! Maps descriptor field types onto Dart types.

use dart_model::{DartType, Scalar};

use crate::descriptor::{FieldInfo, FieldType, NodeId, ProtoType};
use crate::name::NameResolver;

/// Translates fields into [`DartType`]s
#[derive(Debug, Clone, Copy)]
pub struct TypeMapper<'a> {
    names: NameResolver<'a>,
}

impl<'a> TypeMapper<'a> {
    pub fn new(names: NameResolver<'a>) -> Self {
        Self { names }
    }

    /// Dart type of a field as it appears in a generated signature
    pub fn map_type(&self, field: NodeId) -> DartType {
        let tree = self.names.tree();
        let Some(info) = tree.field(field) else {
            unreachable!("`{}` is not a field", tree.fully_qualified_name(field));
        };

        if let Some((key, value)) = tree.map_entry(field) {
            let key = match tree.field(key).map(|k| k.ty) {
                Some(FieldType::Scalar(ty)) => scalar_type(ty),
                _ => unreachable!("map keys are always scalar"),
            };
            let Some(value) = tree.field(value) else {
                unreachable!("map entry value is not a field");
            };
            return DartType::map(DartType::Scalar(key), self.element_type(value));
        }

        if info.is_repeated() {
            return DartType::list(self.element_type(info));
        }

        let ty = self.element_type(info);
        if info.explicit_presence { ty.nullable() } else { ty }
    }

    /// Type of a single value of the field, ignoring cardinality and presence
    pub fn element_type(&self, info: &FieldInfo) -> DartType {
        DartType::Scalar(match info.ty {
            FieldType::Message(id) | FieldType::Enum(id) => Scalar::Named(self.names.resolve(id)),
            FieldType::Scalar(ty) => scalar_type(ty),
        })
    }
}

/// Scalar wire types to their Dart representation
pub fn scalar_type(ty: ProtoType) -> Scalar {
    match ty {
        ProtoType::Double | ProtoType::Float => Scalar::Double,
        ProtoType::Int64 | ProtoType::SFixed64 | ProtoType::SInt64 => Scalar::Int64,
        ProtoType::UInt64 | ProtoType::Fixed64 => Scalar::Int64,
        ProtoType::Int32 | ProtoType::SFixed32 | ProtoType::SInt32 => Scalar::Int,
        ProtoType::UInt32 | ProtoType::Fixed32 => Scalar::Int,
        ProtoType::Bool => Scalar::Bool,
        ProtoType::String => Scalar::String,
        ProtoType::Bytes => Scalar::Bytes,
    }
}
