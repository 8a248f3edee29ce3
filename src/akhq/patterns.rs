//! ACE to regular expression compilation
//!
//! Every pattern is anchored at both ends. Resource names are escaped with
//! `regex::escape`, so a resource can never widen the match on its own.

use crate::model::{AccessControlEntry, AccessControlEntrySpec, ResourcePatternType, ResourceType};

/// Matches nothing. Returned when a requester holds no grant for a resource type.
pub const DENY_ALL_PATTERN: &str = "^none$";

/// Matches every resource. Only handed out to administrators.
pub const ALLOW_ALL_PATTERN: &str = ".*$";

/// Matches every managed cluster
pub const ALL_CLUSTERS_PATTERN: &str = "^.*$";

pub fn literal_pattern(resource: &str) -> String {
    format!("^{}$", regex::escape(resource))
}

pub fn prefixed_pattern(resource: &str) -> String {
    format!("^{}.*$", regex::escape(resource))
}

/// Pattern covering the resources an ACE grants
pub fn resource_pattern(spec: &AccessControlEntrySpec) -> String {
    match spec.resource_pattern_type {
        ResourcePatternType::Literal => literal_pattern(&spec.resource),
        ResourcePatternType::Prefixed => prefixed_pattern(&spec.resource),
    }
}

/// Pattern covering the registry subjects of a topic ACE.
///
/// Subjects are named `<topic>-key` and `<topic>-value`, so a prefixed grant
/// already covers them.
pub fn schema_pattern(spec: &AccessControlEntrySpec) -> String {
    match spec.resource_pattern_type {
        ResourcePatternType::Literal => {
            format!("^{}-(key|value)$", regex::escape(&spec.resource))
        }
        ResourcePatternType::Prefixed => prefixed_pattern(&spec.resource),
    }
}

pub fn cluster_pattern(cluster: &str) -> String {
    format!("^{}$", regex::escape(cluster))
}

/// Compile the ACEs of one resource type into a deduplicated pattern list.
///
/// Patterns keep the order of their first occurrence. An empty result is
/// replaced by [`DENY_ALL_PATTERN`].
pub fn compute_allowed_patterns(
    aces: &[AccessControlEntry],
    resource_type: ResourceType,
) -> Vec<String> {
    let mut patterns: Vec<String> = Vec::new();

    for ace in aces.iter().filter(|ace| ace.spec.resource_type == resource_type) {
        let pattern = resource_pattern(&ace.spec);
        if !patterns.contains(&pattern) {
            patterns.push(pattern);
        }
    }

    if patterns.is_empty() {
        patterns.push(DENY_ALL_PATTERN.to_string());
    }

    patterns
}

fn same_scope(a: &AccessControlEntry, b: &AccessControlEntry) -> bool {
    a.spec.resource_type == b.spec.resource_type
        && a.spec.resource_pattern_type == b.spec.resource_pattern_type
        && a.spec.resource == b.spec.resource
        && a.cluster() == b.cluster()
}

fn covers(prefix: &AccessControlEntry, ace: &AccessControlEntry) -> bool {
    prefix.spec.resource_pattern_type == ResourcePatternType::Prefixed
        && prefix.spec.resource_type == ace.spec.resource_type
        && prefix.cluster() == ace.cluster()
        && !same_scope(prefix, ace)
        && ace.spec.resource.starts_with(&prefix.spec.resource)
}

/// Drop duplicate ACEs and ACEs already covered by a prefixed ACE of the
/// same resource type on the same cluster. Order is preserved.
pub fn optimize_access_control_entries(aces: Vec<AccessControlEntry>) -> Vec<AccessControlEntry> {
    let mut unique: Vec<AccessControlEntry> = Vec::with_capacity(aces.len());
    for ace in aces {
        if !unique.iter().any(|kept| same_scope(kept, &ace)) {
            unique.push(ace);
        }
    }

    let covered: Vec<bool> = unique
        .iter()
        .map(|ace| unique.iter().any(|other| covers(other, ace)))
        .collect();

    unique
        .into_iter()
        .zip(covered)
        .filter_map(|(ace, covered)| (!covered).then_some(ace))
        .collect()
}
