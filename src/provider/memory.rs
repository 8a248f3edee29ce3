use super::{AccessControlEntryProvider, NamespaceProvider};
use crate::model::{AccessControlEntry, Namespace};
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Resources loaded from a TOML seed file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceCatalog {
    #[serde(default)]
    pub namespaces: Vec<Namespace>,
    #[serde(default)]
    pub access_control_entries: Vec<AccessControlEntry>,
}

impl ResourceCatalog {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// In-memory namespace and ACE store
#[derive(Debug, Clone, Default)]
pub struct InMemoryResourceStore {
    namespaces: Arc<RwLock<Vec<Namespace>>>,
    access_control_entries: Arc<RwLock<Vec<AccessControlEntry>>>,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_catalog(catalog: ResourceCatalog) -> Self {
        let store = Self::new();
        for namespace in catalog.namespaces {
            store.apply_namespace(namespace);
        }
        for ace in catalog.access_control_entries {
            store.apply_access_control_entry(ace);
        }
        info!(
            "Loaded {} namespaces and {} access control entries",
            store.namespaces.read().len(),
            store.access_control_entries.read().len()
        );
        store
    }

    /// Create or replace a namespace, keyed by name
    pub fn apply_namespace(&self, mut namespace: Namespace) -> Namespace {
        let mut namespaces = self.namespaces.write();
        match namespaces
            .iter_mut()
            .find(|existing| existing.name() == namespace.name())
        {
            Some(existing) => {
                namespace.metadata.creation_timestamp = existing.metadata.creation_timestamp;
                *existing = namespace.clone();
            }
            None => {
                namespace
                    .metadata
                    .creation_timestamp
                    .get_or_insert_with(Utc::now);
                namespaces.push(namespace.clone());
            }
        }
        namespace
    }

    /// Create or replace an ACE, keyed by name, namespace and cluster
    pub fn apply_access_control_entry(&self, mut ace: AccessControlEntry) -> AccessControlEntry {
        let mut entries = self.access_control_entries.write();
        match entries.iter_mut().find(|existing| existing.same_identity(&ace)) {
            Some(existing) => {
                ace.metadata.creation_timestamp = existing.metadata.creation_timestamp;
                *existing = ace.clone();
            }
            None => {
                ace.metadata.creation_timestamp.get_or_insert_with(Utc::now);
                entries.push(ace.clone());
            }
        }
        ace
    }

    pub fn list_access_control_entries(&self) -> Vec<AccessControlEntry> {
        self.access_control_entries.read().clone()
    }
}

#[async_trait]
impl NamespaceProvider for InMemoryResourceStore {
    async fn list_all(&self) -> Result<Vec<Namespace>> {
        Ok(self.namespaces.read().clone())
    }
}

#[async_trait]
impl AccessControlEntryProvider for InMemoryResourceStore {
    async fn find_all_granted_to_namespace(
        &self,
        namespace: &Namespace,
    ) -> Result<Vec<AccessControlEntry>> {
        let granted: Vec<AccessControlEntry> = self
            .access_control_entries
            .read()
            .iter()
            .filter(|ace| {
                ace.spec.granted_to == namespace.name() && ace.cluster() == namespace.cluster()
            })
            .cloned()
            .collect();
        debug!(
            "Found {} ACEs granted to namespace {}",
            granted.len(),
            namespace.name()
        );
        Ok(granted)
    }

    async fn find_all_public_granted_to(&self) -> Result<Vec<AccessControlEntry>> {
        Ok(self
            .access_control_entries
            .read()
            .iter()
            .filter(|ace| ace.is_public())
            .cloned()
            .collect())
    }
}
