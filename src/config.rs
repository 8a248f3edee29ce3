use crate::model::ResourceType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub akhq: AkhqConfig,
    /// Kafka clusters managed by this control plane
    #[serde(default)]
    pub managed_clusters: Vec<ManagedClusterConfig>,
    /// TOML catalog of namespaces and ACEs loaded into the in-memory store
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedClusterConfig {
    pub name: String,
}

/// Claim generation settings for the AKHQ authorization provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AkhqConfig {
    /// Namespace label holding the support groups allowed to claim it
    pub group_label: String,
    /// Identity-provider group granted full access
    pub admin_group: String,
    /// Role attached to each resource type for regular users (grouped claims)
    #[serde(default)]
    pub roles: BTreeMap<ResourceType, String>,
    /// Role attached to each resource type for administrators (grouped claims)
    #[serde(default)]
    pub admin_roles: BTreeMap<ResourceType, String>,
    /// Roles returned to regular users by the flat claim formats
    #[serde(default)]
    pub former_roles: Vec<String>,
    /// Roles returned to administrators by the flat claim formats
    #[serde(default)]
    pub former_admin_roles: Vec<String>,
}

impl Default for AkhqConfig {
    fn default() -> Self {
        let roles = BTreeMap::from([
            (ResourceType::Topic, "topic-read".to_string()),
            (ResourceType::Connect, "connect-rw".to_string()),
            (ResourceType::Group, "group-read".to_string()),
            (ResourceType::Schema, "registry-read".to_string()),
        ]);
        let admin_roles = BTreeMap::from([
            (ResourceType::Topic, "topic-admin".to_string()),
            (ResourceType::Connect, "connect-admin".to_string()),
            (ResourceType::Group, "group-admin".to_string()),
            (ResourceType::Schema, "registry-admin".to_string()),
        ]);

        Self {
            group_label: "support-group".to_string(),
            admin_group: "_".to_string(),
            roles,
            admin_roles,
            former_roles: vec![
                "topic/read".to_string(),
                "topic/data/read".to_string(),
                "group/read".to_string(),
                "registry/read".to_string(),
                "connect/read".to_string(),
                "connect/state/update".to_string(),
            ],
            former_admin_roles: vec![
                "topic/read".to_string(),
                "topic/data/read".to_string(),
                "group/read".to_string(),
                "registry/read".to_string(),
                "connect/read".to_string(),
                "connect/state/update".to_string(),
                "users/reader".to_string(),
                "topic/insert".to_string(),
                "topic/delete".to_string(),
                "registry/version/delete".to_string(),
            ],
        }
    }
}

impl AkhqConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.group_label.trim().is_empty() {
            return Err(crate::error::Ns4KafkaError::InvalidConfig(
                "akhq.group_label cannot be empty".to_string(),
            ));
        }

        if self.admin_group.trim().is_empty() {
            return Err(crate::error::Ns4KafkaError::InvalidConfig(
                "akhq.admin_group cannot be empty".to_string(),
            ));
        }

        for (resource_type, role) in self.roles.iter().chain(self.admin_roles.iter()) {
            if role.trim().is_empty() {
                return Err(crate::error::Ns4KafkaError::InvalidConfig(format!(
                    "akhq role for {} cannot be empty",
                    resource_type
                )));
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            akhq: AkhqConfig::default(),
            managed_clusters: vec![ManagedClusterConfig {
                name: "local".to_string(),
            }],
            seed_path: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::error::Ns4KafkaError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Names of the managed clusters, in declaration order
    pub fn managed_cluster_names(&self) -> Vec<String> {
        self.managed_clusters.iter().map(|c| c.name.clone()).collect()
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.server.port == 0 {
            return Err(crate::error::Ns4KafkaError::InvalidConfig(
                "server.port must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for cluster in &self.managed_clusters {
            if cluster.name.trim().is_empty() {
                return Err(crate::error::Ns4KafkaError::InvalidConfig(
                    "managed_clusters.name cannot be empty".to_string(),
                ));
            }
            if !seen.insert(cluster.name.as_str()) {
                return Err(crate::error::Ns4KafkaError::InvalidConfig(format!(
                    "managed cluster '{}' is declared more than once",
                    cluster.name
                )));
            }
        }

        self.akhq.validate()?;

        Ok(())
    }
}
