//! Access Control Entries
//!
//! An ACE records that a grantor namespace gives a permission over a resource
//! pattern to another namespace, or to everyone when granted to `*`.

use super::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Grantee used for public grants
pub const PUBLIC_GRANTEE: &str = "*";

/// Resource type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResourceType {
    /// Kafka topic
    Topic,

    /// Kafka Connect connector
    Connect,

    /// Consumer group
    Group,

    /// Schema Registry subject
    Schema,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Topic => "TOPIC",
            ResourceType::Connect => "CONNECT",
            ResourceType::Group => "GROUP",
            ResourceType::Schema => "SCHEMA",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TOPIC" => Ok(ResourceType::Topic),
            "CONNECT" => Ok(ResourceType::Connect),
            "GROUP" => Ok(ResourceType::Group),
            "SCHEMA" => Ok(ResourceType::Schema),
            _ => Err(format!("Unknown resource type: {}", s)),
        }
    }
}

impl TryFrom<String> for ResourceType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceType> for String {
    fn from(value: ResourceType) -> Self {
        value.as_str().to_string()
    }
}

/// How the resource name of an ACE is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourcePatternType {
    /// Exact resource name
    Literal,

    /// Any resource name starting with the resource
    Prefixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    Owner,
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControlEntrySpec {
    pub resource_type: ResourceType,
    pub resource: String,
    pub resource_pattern_type: ResourcePatternType,
    pub permission: Permission,

    /// Namespace name, or `*` for a public grant
    pub granted_to: String,
}

/// ACE granted by `metadata.namespace` on `metadata.cluster`.
/// Identified by name, namespace and cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlEntry {
    pub metadata: ObjectMeta,
    pub spec: AccessControlEntrySpec,
}

impl AccessControlEntry {
    pub fn new(metadata: ObjectMeta, spec: AccessControlEntrySpec) -> Self {
        Self { metadata, spec }
    }

    pub fn cluster(&self) -> &str {
        &self.metadata.cluster
    }

    pub fn is_public(&self) -> bool {
        self.spec.granted_to == PUBLIC_GRANTEE
    }

    pub fn same_identity(&self, other: &AccessControlEntry) -> bool {
        self.metadata.name == other.metadata.name
            && self.metadata.namespace == other.metadata.namespace
            && self.metadata.cluster == other.metadata.cluster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_resource_type_parsing() {
        assert_eq!("TOPIC".parse::<ResourceType>().unwrap(), ResourceType::Topic);
        assert_eq!("connect".parse::<ResourceType>().unwrap(), ResourceType::Connect);
        assert!("BROKER".parse::<ResourceType>().is_err());
    }

    #[test]
    fn test_ace_json_shape() {
        let ace = AccessControlEntry::new(
            ObjectMeta::new("ns1-acl", "ns1", "local"),
            AccessControlEntrySpec {
                resource_type: ResourceType::Topic,
                resource: "project1.".to_string(),
                resource_pattern_type: ResourcePatternType::Prefixed,
                permission: Permission::Owner,
                granted_to: "ns1".to_string(),
            },
        );

        let json = serde_json::to_value(&ace).unwrap();
        assert_eq!(json["spec"]["resourceType"], "TOPIC");
        assert_eq!(json["spec"]["resourcePatternType"], "PREFIXED");
        assert_eq!(json["spec"]["grantedTo"], "ns1");
        assert_eq!(json["metadata"]["cluster"], "local");

        let decoded: AccessControlEntry = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, ace);
        assert!(!decoded.is_public());
    }

    #[test]
    fn test_resource_type_as_map_key() {
        let roles: BTreeMap<ResourceType, String> =
            serde_json::from_str(r#"{"TOPIC": "topic-read", "SCHEMA": "registry-read"}"#).unwrap();

        assert_eq!(roles.get(&ResourceType::Topic).unwrap(), "topic-read");
        assert_eq!(roles.get(&ResourceType::Schema).unwrap(), "registry-read");
    }
}
