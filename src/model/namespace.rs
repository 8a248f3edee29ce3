use super::ObjectMeta;
use serde::{Deserialize, Serialize};

/// A tenant of the control plane, bound to a single managed cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub metadata: ObjectMeta,
}

impl Namespace {
    pub fn new(name: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::new(name, "", cluster),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata = self.metadata.with_label(key, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn cluster(&self) -> &str {
        &self.metadata.cluster
    }

    /// Support groups declared under `label_key`, as a comma-separated list
    pub fn support_groups(&self, label_key: &str) -> Vec<&str> {
        self.metadata
            .labels
            .get(label_key)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|group| !group.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check whether any of the given groups supports this namespace.
    /// Comparison is case-sensitive.
    pub fn is_supported_by<S: AsRef<str>>(&self, label_key: &str, groups: &[S]) -> bool {
        let support_groups = self.support_groups(label_key);
        groups
            .iter()
            .any(|group| support_groups.contains(&group.as_ref()))
    }
}
