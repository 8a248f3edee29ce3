//! Namespace-scoped resources managed by the control plane
//!
//! Only the resources the AKHQ claim provider reads are modelled here:
//! namespaces and the access control entries granted between them.

pub mod acl;
pub mod metadata;
pub mod namespace;

pub use acl::{
    AccessControlEntry, AccessControlEntrySpec, Permission, ResourcePatternType, ResourceType,
    PUBLIC_GRANTEE,
};
pub use metadata::ObjectMeta;
pub use namespace::Namespace;
