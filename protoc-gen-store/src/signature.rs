//! The method-signature extension declared on RPC methods.

use std::collections::BTreeSet;

use prost::Message;

use crate::descriptor::{DescriptorTree, NodeId};
use crate::error::GenerateError;

/// Extension payload naming the request fields a generated operation
/// takes as required parameters
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MethodSignature {
    /// Comma-separated request field names.
    #[prost(string, tag = "1")]
    pub required: String,
}

impl MethodSignature {
    /// Decodes the extension declared on `method`. A method without the
    /// extension has no required fields.
    pub fn for_method(tree: &DescriptorTree, method: NodeId) -> Result<Self, GenerateError> {
        let Some(payload) = tree.method(method).and_then(|m| m.signature.as_deref()) else {
            return Ok(Self::default());
        };

        Self::decode(payload).map_err(|source| GenerateError::MethodSignature {
            method: tree.fully_qualified_name(method),
            source,
        })
    }

    pub fn required_fields(&self) -> BTreeSet<&str> {
        self.required
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Whether the proto field `name` is a required parameter
    pub fn is_required(&self, name: &str) -> bool {
        self.required_fields().contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DescriptorBuilder, MethodInfo};

    fn method_with(payload: Option<Vec<u8>>) -> (DescriptorTree, NodeId) {
        let mut b = DescriptorBuilder::new();
        let file = b.file("s.proto", "pkg");
        let msg = b.message(file, "Req");
        let svc = b.service(file, "Svc");
        let mut info = MethodInfo::unary(msg, msg);
        info.signature = payload;
        let method = b.method(svc, "Get", info);
        (b.build(), method)
    }

    #[test]
    fn test_decode_signature() {
        let sig = MethodSignature {
            required: "id,name".to_string(),
        };
        let (tree, method) = method_with(Some(sig.encode_to_vec()));

        let decoded = MethodSignature::for_method(&tree, method).unwrap();
        assert_eq!(decoded, sig);
        assert!(decoded.is_required("id"));
        assert!(decoded.is_required("name"));
        assert!(!decoded.is_required("email"));
    }

    #[test]
    fn test_missing_signature_requires_nothing() {
        let (tree, method) = method_with(None);

        let sig = MethodSignature::for_method(&tree, method).unwrap();
        assert!(sig.required_fields().is_empty());
    }

    #[test]
    fn test_malformed_signature_names_method() {
        // length-delimited field 1 claiming more bytes than present
        let (tree, method) = method_with(Some(vec![0x0a, 0x05, b'i']));

        let err = MethodSignature::for_method(&tree, method).unwrap_err();
        assert!(matches!(err, GenerateError::MethodSignature { ref method, .. } if method == ".pkg.Svc.Get"));
        assert!(err.to_string().starts_with("failed to decode method signature of .pkg.Svc.Get"));
    }

    #[test]
    fn test_required_list_is_trimmed() {
        let sig = MethodSignature {
            required: " id , name,,".to_string(),
        };

        assert_eq!(sig.required_fields().into_iter().collect::<Vec<_>>(), vec!["id", "name"]);
    }
}
