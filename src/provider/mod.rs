//! Collaborators queried by the claim provider
//!
//! The claim provider only reads namespaces and the ACEs granted to them.
//! Both lookups sit behind traits so the backing store can be swapped
//! without touching claim generation.

pub mod memory;

use crate::model::{AccessControlEntry, Namespace};
use crate::Result;
use async_trait::async_trait;

pub use memory::{InMemoryResourceStore, ResourceCatalog};

#[async_trait]
pub trait NamespaceProvider: Send + Sync {
    /// List every namespace across all managed clusters
    async fn list_all(&self) -> Result<Vec<Namespace>>;
}

#[async_trait]
pub trait AccessControlEntryProvider: Send + Sync {
    /// ACEs granted to `namespace` on its own cluster
    async fn find_all_granted_to_namespace(
        &self,
        namespace: &Namespace,
    ) -> Result<Vec<AccessControlEntry>>;

    /// ACEs granted to everyone, on every cluster
    async fn find_all_public_granted_to(&self) -> Result<Vec<AccessControlEntry>>;
}
