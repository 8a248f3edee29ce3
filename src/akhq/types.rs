use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const TOPICS_FILTER_ATTRIBUTE: &str = "topicsFilterRegexp";
pub const CONNECTS_FILTER_ATTRIBUTE: &str = "connectsFilterRegexp";
pub const CONSUMER_GROUPS_FILTER_ATTRIBUTE: &str = "consumerGroupsFilterRegexp";

/// Key of the single entry in a grouped claim
pub const GROUPS_KEY: &str = "group";

/// Claim request sent by AKHQ for an authenticated user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AkhqClaimRequest {
    #[serde(default)]
    pub provider_type: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub groups: Option<Vec<String>>,
}

impl AkhqClaimRequest {
    pub fn with_groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            groups: Some(groups.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }
}

/// Legacy claim: roles plus a map of filter attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AkhqClaimResponse {
    pub roles: Vec<String>,
    pub attributes: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AkhqClaimResponseV2 {
    pub roles: Vec<String>,
    pub topics_filter_regexp: Vec<String>,
    pub connects_filter_regexp: Vec<String>,
    pub consumer_groups_filter_regexp: Vec<String>,
}

/// Grouped claim. `groups` is `null` when the requester has nothing to claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AkhqClaimResponseV3 {
    pub groups: Option<BTreeMap<String, Vec<AkhqGroup>>>,
}

impl AkhqClaimResponseV3 {
    pub fn empty() -> Self {
        Self { groups: None }
    }

    pub fn from_groups(groups: Vec<AkhqGroup>) -> Self {
        if groups.is_empty() {
            return Self::empty();
        }
        Self {
            groups: Some(BTreeMap::from([(GROUPS_KEY.to_string(), groups)])),
        }
    }

    /// Groups of the claim, empty when nothing was granted
    pub fn group_list(&self) -> &[AkhqGroup] {
        self.groups
            .as_ref()
            .and_then(|groups| groups.get(GROUPS_KEY))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// One AKHQ role restricted to resource patterns on a set of clusters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AkhqGroup {
    pub role: String,
    pub patterns: Vec<String>,
    pub clusters: Vec<String>,
}

/// Flat claim shared by the legacy and v2 formats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatClaim {
    pub roles: Vec<String>,
    pub topics: Vec<String>,
    pub connects: Vec<String>,
    pub consumer_groups: Vec<String>,
}

impl From<FlatClaim> for AkhqClaimResponse {
    fn from(claim: FlatClaim) -> Self {
        let attributes = BTreeMap::from([
            (TOPICS_FILTER_ATTRIBUTE.to_string(), claim.topics),
            (CONNECTS_FILTER_ATTRIBUTE.to_string(), claim.connects),
            (CONSUMER_GROUPS_FILTER_ATTRIBUTE.to_string(), claim.consumer_groups),
        ]);
        Self {
            roles: claim.roles,
            attributes,
        }
    }
}

impl From<FlatClaim> for AkhqClaimResponseV2 {
    fn from(claim: FlatClaim) -> Self {
        Self {
            roles: claim.roles,
            topics_filter_regexp: claim.topics,
            connects_filter_regexp: claim.connects,
            consumer_groups_filter_regexp: claim.consumer_groups,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimVersion {
    V1,
    V2,
    V3,
}

impl ClaimVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimVersion::V1 => "v1",
            ClaimVersion::V2 => "v2",
            ClaimVersion::V3 => "v3",
        }
    }
}

impl fmt::Display for ClaimVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a claim request was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Admin,
    Granted,
    Denied,
}

impl ClaimOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimOutcome::Admin => "admin",
            ClaimOutcome::Granted => "granted",
            ClaimOutcome::Denied => "denied",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_accepts_missing_fields() {
        let request: AkhqClaimRequest = serde_json::from_value(json!({"username": "user1"})).unwrap();
        assert_eq!(request.username.as_deref(), Some("user1"));
        assert!(request.groups.is_none());

        let request: AkhqClaimRequest = serde_json::from_value(json!({
            "providerType": "LDAP",
            "providerName": "ldap",
            "username": "user1",
            "groups": ["GP-PROJECT1"]
        }))
        .unwrap();
        assert_eq!(request.provider_type.as_deref(), Some("LDAP"));
        assert_eq!(request.groups, Some(vec!["GP-PROJECT1".to_string()]));
    }

    #[test]
    fn test_flat_claim_wire_formats() {
        let claim = FlatClaim {
            roles: vec!["topic/read".to_string()],
            topics: vec!["^a$".to_string()],
            connects: vec!["^none$".to_string()],
            consumer_groups: vec!["^b.*$".to_string()],
        };

        let v1 = serde_json::to_value(AkhqClaimResponse::from(claim.clone())).unwrap();
        assert_eq!(
            v1,
            json!({
                "roles": ["topic/read"],
                "attributes": {
                    "topicsFilterRegexp": ["^a$"],
                    "connectsFilterRegexp": ["^none$"],
                    "consumerGroupsFilterRegexp": ["^b.*$"]
                }
            })
        );

        let v2 = serde_json::to_value(AkhqClaimResponseV2::from(claim)).unwrap();
        assert_eq!(
            v2,
            json!({
                "roles": ["topic/read"],
                "topicsFilterRegexp": ["^a$"],
                "connectsFilterRegexp": ["^none$"],
                "consumerGroupsFilterRegexp": ["^b.*$"]
            })
        );
    }

    #[test]
    fn test_v3_wire_format() {
        let empty = serde_json::to_value(AkhqClaimResponseV3::from_groups(vec![])).unwrap();
        assert_eq!(empty, json!({"groups": null}));

        let response = AkhqClaimResponseV3::from_groups(vec![AkhqGroup {
            role: "topic-read".to_string(),
            patterns: vec!["^a$".to_string()],
            clusters: vec!["^local$".to_string()],
        }]);
        assert_eq!(response.group_list().len(), 1);
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({"groups": {"group": [
                {"role": "topic-read", "patterns": ["^a$"], "clusters": ["^local$"]}
            ]}})
        );
    }
}
