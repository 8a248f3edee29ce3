use super::patterns::{
    cluster_pattern, compute_allowed_patterns, optimize_access_control_entries, resource_pattern,
    schema_pattern, ALLOW_ALL_PATTERN, ALL_CLUSTERS_PATTERN, DENY_ALL_PATTERN,
};
use super::types::{
    AkhqClaimRequest, AkhqClaimResponse, AkhqClaimResponseV2, AkhqClaimResponseV3, AkhqGroup,
    ClaimOutcome, ClaimVersion, FlatClaim,
};
use crate::config::AkhqConfig;
use crate::metrics::ClaimMetrics;
use crate::model::{AccessControlEntry, Namespace, ResourceType};
use crate::provider::{AccessControlEntryProvider, NamespaceProvider};
use crate::Result;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Generates AKHQ authorization claims from the ACEs granted to the
/// namespaces a user supports
pub struct AkhqClaimProvider {
    config: AkhqConfig,
    managed_clusters: Vec<String>,
    namespace_provider: Arc<dyn NamespaceProvider>,
    ace_provider: Arc<dyn AccessControlEntryProvider>,
    metrics: Option<Arc<ClaimMetrics>>,
}

/// Patterns of one role, each with the clusters it was granted on
struct RoleBindings {
    role: String,
    patterns: Vec<(String, BTreeSet<String>)>,
}

impl RoleBindings {
    fn bind(bindings: &mut Vec<RoleBindings>, role: &str, pattern: String, cluster: &str) {
        let index = match bindings.iter().position(|b| b.role == role) {
            Some(index) => index,
            None => {
                bindings.push(RoleBindings {
                    role: role.to_string(),
                    patterns: Vec::new(),
                });
                bindings.len() - 1
            }
        };

        let patterns = &mut bindings[index].patterns;
        match patterns.iter_mut().find(|(existing, _)| *existing == pattern) {
            Some((_, clusters)) => {
                clusters.insert(cluster.to_string());
            }
            None => patterns.push((pattern, BTreeSet::from([cluster.to_string()]))),
        }
    }
}

impl AkhqClaimProvider {
    pub fn new(
        config: AkhqConfig,
        managed_clusters: Vec<String>,
        namespace_provider: Arc<dyn NamespaceProvider>,
        ace_provider: Arc<dyn AccessControlEntryProvider>,
    ) -> Self {
        Self {
            config,
            managed_clusters,
            namespace_provider,
            ace_provider,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<ClaimMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Legacy claim: roles plus filter attributes
    pub async fn generate_claim(
        &self,
        request: Option<AkhqClaimRequest>,
    ) -> Result<AkhqClaimResponse> {
        let claim = self
            .observe(ClaimVersion::V1, self.flat_claim(ClaimVersion::V1, request))
            .await?;
        Ok(claim.into())
    }

    pub async fn generate_claim_v2(
        &self,
        request: Option<AkhqClaimRequest>,
    ) -> Result<AkhqClaimResponseV2> {
        let claim = self
            .observe(ClaimVersion::V2, self.flat_claim(ClaimVersion::V2, request))
            .await?;
        Ok(claim.into())
    }

    /// Grouped claim: one entry per role and distinct cluster set
    pub async fn generate_claim_v3(
        &self,
        request: Option<AkhqClaimRequest>,
    ) -> Result<AkhqClaimResponseV3> {
        self.observe(ClaimVersion::V3, self.grouped_claim(request)).await
    }

    async fn observe<T>(
        &self,
        version: ClaimVersion,
        claim: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        let result = claim.await;
        if let Err(e) = &result {
            error!("Failed to generate {} claim: {}", version, e);
            if let Some(metrics) = &self.metrics {
                metrics.record_error(version);
            }
        }
        result
    }

    fn record(&self, version: ClaimVersion, outcome: ClaimOutcome) {
        if let Some(metrics) = &self.metrics {
            metrics.record_claim(version, outcome);
        }
    }

    fn requested_groups(request: Option<AkhqClaimRequest>) -> (Option<String>, Vec<String>) {
        match request {
            Some(request) => (request.username, request.groups.unwrap_or_default()),
            None => (None, Vec::new()),
        }
    }

    fn is_admin(&self, groups: &[String]) -> bool {
        groups.iter().any(|group| *group == self.config.admin_group)
    }

    /// Namespaces whose support-group label matches one of the groups,
    /// each listed once
    async fn resolve_namespaces(&self, groups: &[String]) -> Result<Vec<Namespace>> {
        let mut visited = HashSet::new();
        let namespaces: Vec<Namespace> = self
            .namespace_provider
            .list_all()
            .await?
            .into_iter()
            .filter(|namespace| namespace.is_supported_by(&self.config.group_label, groups))
            .filter(|namespace| {
                visited.insert((namespace.name().to_string(), namespace.cluster().to_string()))
            })
            .collect();

        debug!(
            "Resolved namespaces {:?} for groups {:?}",
            namespaces.iter().map(Namespace::name).collect::<Vec<_>>(),
            groups
        );
        Ok(namespaces)
    }

    /// ACEs granted to the namespaces, followed by the public ones
    async fn collect_access_control_entries(
        &self,
        namespaces: &[Namespace],
    ) -> Result<Vec<AccessControlEntry>> {
        let mut aces = Vec::new();
        for namespace in namespaces {
            aces.extend(self.ace_provider.find_all_granted_to_namespace(namespace).await?);
        }
        aces.extend(self.ace_provider.find_all_public_granted_to().await?);
        Ok(aces)
    }

    async fn flat_claim(
        &self,
        version: ClaimVersion,
        request: Option<AkhqClaimRequest>,
    ) -> Result<FlatClaim> {
        let (username, groups) = Self::requested_groups(request);

        if self.is_admin(&groups) {
            info!("Generating {} admin claim for user {:?}", version, username);
            self.record(version, ClaimOutcome::Admin);
            return Ok(FlatClaim {
                roles: self.config.former_admin_roles.clone(),
                topics: vec![ALLOW_ALL_PATTERN.to_string()],
                connects: vec![ALLOW_ALL_PATTERN.to_string()],
                consumer_groups: vec![ALLOW_ALL_PATTERN.to_string()],
            });
        }

        info!(
            "Generating {} claim for user {:?} with {} groups",
            version,
            username,
            groups.len()
        );

        if groups.is_empty() {
            self.record(version, ClaimOutcome::Denied);
            return Ok(self.deny_all());
        }

        // Public ACEs apply even when no namespace matched
        let namespaces = self.resolve_namespaces(&groups).await?;
        let aces = self.collect_access_control_entries(&namespaces).await?;

        let claim = FlatClaim {
            roles: self.config.former_roles.clone(),
            topics: compute_allowed_patterns(&aces, ResourceType::Topic),
            connects: compute_allowed_patterns(&aces, ResourceType::Connect),
            consumer_groups: compute_allowed_patterns(&aces, ResourceType::Group),
        };

        self.record(
            version,
            if claim == self.deny_all() {
                ClaimOutcome::Denied
            } else {
                ClaimOutcome::Granted
            },
        );
        Ok(claim)
    }

    async fn grouped_claim(&self, request: Option<AkhqClaimRequest>) -> Result<AkhqClaimResponseV3> {
        let version = ClaimVersion::V3;
        let (username, groups) = Self::requested_groups(request);

        if self.is_admin(&groups) {
            info!("Generating {} admin claim for user {:?}", version, username);
            self.record(version, ClaimOutcome::Admin);
            let admin_groups = self
                .config
                .admin_roles
                .values()
                .map(|role| AkhqGroup {
                    role: role.clone(),
                    patterns: vec![ALLOW_ALL_PATTERN.to_string()],
                    clusters: vec![ALL_CLUSTERS_PATTERN.to_string()],
                })
                .collect();
            return Ok(AkhqClaimResponseV3::from_groups(admin_groups));
        }

        info!(
            "Generating {} claim for user {:?} with {} groups",
            version,
            username,
            groups.len()
        );

        if groups.is_empty() {
            self.record(version, ClaimOutcome::Denied);
            return Ok(AkhqClaimResponseV3::empty());
        }

        let namespaces = self.resolve_namespaces(&groups).await?;
        if namespaces.is_empty() {
            self.record(version, ClaimOutcome::Denied);
            return Ok(AkhqClaimResponseV3::empty());
        }

        let aces = self.collect_access_control_entries(&namespaces).await?;
        let response = AkhqClaimResponseV3::from_groups(self.group_bindings(aces));

        self.record(
            version,
            if response.groups.is_none() {
                ClaimOutcome::Denied
            } else {
                ClaimOutcome::Granted
            },
        );
        Ok(response)
    }

    /// Build role groups from the ACEs.
    ///
    /// Roles keep the order in which they are first bound. Within a role,
    /// patterns granted on the same set of clusters share one group, and
    /// groups follow the order of the first pattern of each cluster set.
    fn group_bindings(&self, aces: Vec<AccessControlEntry>) -> Vec<AkhqGroup> {
        let aces = optimize_access_control_entries(aces);
        let mut bindings: Vec<RoleBindings> = Vec::new();

        for ace in &aces {
            match self.config.roles.get(&ace.spec.resource_type) {
                Some(role) => {
                    RoleBindings::bind(&mut bindings, role, resource_pattern(&ace.spec), ace.cluster())
                }
                None => debug!("No role configured for resource type {}", ace.spec.resource_type),
            }

            if ace.spec.resource_type == ResourceType::Topic {
                if let Some(role) = self.config.roles.get(&ResourceType::Schema) {
                    RoleBindings::bind(&mut bindings, role, schema_pattern(&ace.spec), ace.cluster());
                }
            }
        }

        let mut groups = Vec::new();
        for binding in bindings {
            let mut by_clusters: Vec<(BTreeSet<String>, Vec<String>)> = Vec::new();
            for (pattern, clusters) in binding.patterns {
                match by_clusters.iter_mut().find(|(existing, _)| *existing == clusters) {
                    Some((_, patterns)) => patterns.push(pattern),
                    None => by_clusters.push((clusters, vec![pattern])),
                }
            }

            for (clusters, patterns) in by_clusters {
                groups.push(AkhqGroup {
                    role: binding.role.clone(),
                    patterns,
                    clusters: self.cluster_patterns(&clusters),
                });
            }
        }
        groups
    }

    /// Sorted cluster patterns, collapsed to a wildcard when every managed
    /// cluster is covered
    fn cluster_patterns(&self, clusters: &BTreeSet<String>) -> Vec<String> {
        let covers_all = !self.managed_clusters.is_empty()
            && self
                .managed_clusters
                .iter()
                .all(|cluster| clusters.contains(cluster));

        if covers_all {
            vec![ALL_CLUSTERS_PATTERN.to_string()]
        } else {
            clusters.iter().map(|cluster| cluster_pattern(cluster)).collect()
        }
    }

    /// Deny-all flat claim, as returned for a request without groups
    pub fn deny_all(&self) -> FlatClaim {
        FlatClaim {
            roles: self.config.former_roles.clone(),
            topics: vec![DENY_ALL_PATTERN.to_string()],
            connects: vec![DENY_ALL_PATTERN.to_string()],
            consumer_groups: vec![DENY_ALL_PATTERN.to_string()],
        }
    }
}
