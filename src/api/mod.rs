use crate::akhq::{AkhqClaimProvider, AkhqClaimRequest};
use crate::config::ServerConfig;
use crate::error::Ns4KafkaError;
use crate::metrics::ClaimMetrics;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

const MAX_CLAIM_BODY_BYTES: u64 = 16 * 1024;

/// REST server exposing the AKHQ claim endpoints
pub struct ClaimApi {
    claim_provider: Arc<AkhqClaimProvider>,
    metrics: Arc<ClaimMetrics>,
    server: ServerConfig,
    start_time: Instant,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Claim or metrics generation failed on a collaborator
#[derive(Debug)]
pub struct ClaimGenerationFailed(pub String);

impl warp::reject::Reject for ClaimGenerationFailed {}

impl ClaimApi {
    pub fn new(
        claim_provider: Arc<AkhqClaimProvider>,
        metrics: Arc<ClaimMetrics>,
        server: ServerConfig,
    ) -> Self {
        Self {
            claim_provider,
            metrics,
            server,
            start_time: Instant::now(),
        }
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
        let provider = self.claim_provider.clone();

        let health = warp::path("health")
            .and(warp::path::end())
            .and(warp::get())
            .and(with_start_time(self.start_time))
            .and_then(handle_health);

        let metrics = warp::path("metrics")
            .and(warp::path::end())
            .and(warp::get())
            .and(with_metrics(self.metrics.clone()))
            .and_then(handle_metrics);

        let claim_v1 = warp::path!("akhq-claim")
            .and(warp::post())
            .and(claim_body())
            .and(with_claim_provider(provider.clone()))
            .and_then(handle_claim);

        let claim_v2 = warp::path!("akhq-claim" / "v2")
            .and(warp::post())
            .and(claim_body())
            .and(with_claim_provider(provider.clone()))
            .and_then(handle_claim_v2);

        let claim_v3 = warp::path!("akhq-claim" / "v3")
            .and(warp::post())
            .and(claim_body())
            .and(with_claim_provider(provider))
            .and_then(handle_claim_v3);

        health
            .or(metrics)
            .or(claim_v1)
            .or(claim_v2)
            .or(claim_v3)
            .with(warp::trace::request())
            .recover(handle_rejection)
    }

    /// Start the HTTP server
    pub async fn start(&self) -> Result<()> {
        let address: IpAddr = self.server.listen_address.parse().map_err(|e| {
            Ns4KafkaError::InvalidConfig(format!(
                "server.listen_address '{}': {}",
                self.server.listen_address, e
            ))
        })?;

        info!("Starting claim API server on {}:{}", address, self.server.port);

        warp::serve(self.routes())
            .run((address, self.server.port))
            .await;

        Ok(())
    }
}

/// Warp filter to inject the claim provider
fn with_claim_provider(
    provider: Arc<AkhqClaimProvider>,
) -> impl Filter<Extract = (Arc<AkhqClaimProvider>,), Error = Infallible> + Clone {
    warp::any().map(move || provider.clone())
}

fn with_metrics(
    metrics: Arc<ClaimMetrics>,
) -> impl Filter<Extract = (Arc<ClaimMetrics>,), Error = Infallible> + Clone {
    warp::any().map(move || metrics.clone())
}

fn with_start_time(
    start_time: Instant,
) -> impl Filter<Extract = (Instant,), Error = Infallible> + Clone {
    warp::any().map(move || start_time)
}

/// Claim request body. An empty, `null` or malformed body yields `None`,
/// which is served as a request without groups.
fn claim_body() -> impl Filter<Extract = (Option<AkhqClaimRequest>,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_CLAIM_BODY_BYTES)
        .and(warp::body::bytes())
        .map(|body: Bytes| parse_claim_request(&body))
}

fn parse_claim_request(body: &[u8]) -> Option<AkhqClaimRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    match serde_json::from_slice::<Option<AkhqClaimRequest>>(body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Treating malformed claim request as a request without groups: {}", e);
            None
        }
    }
}

fn generation_failed(e: Ns4KafkaError) -> Rejection {
    warp::reject::custom(ClaimGenerationFailed(e.to_string()))
}

async fn handle_health(start_time: Instant) -> std::result::Result<impl Reply, Rejection> {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
    };

    Ok(warp::reply::json(&response))
}

async fn handle_metrics(metrics: Arc<ClaimMetrics>) -> std::result::Result<impl Reply, Rejection> {
    let body = metrics.encode().map_err(generation_failed)?;
    Ok(warp::reply::with_header(
        body,
        "Content-Type",
        "text/plain; version=0.0.4",
    ))
}

async fn handle_claim(
    request: Option<AkhqClaimRequest>,
    provider: Arc<AkhqClaimProvider>,
) -> std::result::Result<impl Reply, Rejection> {
    let response = provider
        .generate_claim(request)
        .await
        .map_err(generation_failed)?;
    Ok(warp::reply::json(&response))
}

async fn handle_claim_v2(
    request: Option<AkhqClaimRequest>,
    provider: Arc<AkhqClaimProvider>,
) -> std::result::Result<impl Reply, Rejection> {
    let response = provider
        .generate_claim_v2(request)
        .await
        .map_err(generation_failed)?;
    Ok(warp::reply::json(&response))
}

async fn handle_claim_v3(
    request: Option<AkhqClaimRequest>,
    provider: Arc<AkhqClaimProvider>,
) -> std::result::Result<impl Reply, Rejection> {
    let response = provider
        .generate_claim_v3(request)
        .await
        .map_err(generation_failed)?;
    Ok(warp::reply::json(&response))
}

/// Handle warp rejections
async fn handle_rejection(err: Rejection) -> std::result::Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(ClaimGenerationFailed(reason)) = err.find::<ClaimGenerationFailed>() {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = reason.clone();
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        code = warp::http::StatusCode::PAYLOAD_TOO_LARGE;
        message = "Payload Too Large".to_string();
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        code = warp::http::StatusCode::LENGTH_REQUIRED;
        message = "Length Required".to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        error!("Unhandled rejection: {:?}", err);
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    let json = warp::reply::json(&ApiResponse::<()> {
        success: false,
        data: None,
        error: Some(message),
    });

    Ok(warp::reply::with_status(json, code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::akhq::{AkhqClaimResponse, AkhqClaimResponseV2, AkhqClaimResponseV3};
    use crate::config::AkhqConfig;
    use crate::model::{
        AccessControlEntry, AccessControlEntrySpec, Namespace, ObjectMeta, Permission,
        ResourcePatternType, ResourceType,
    };
    use crate::provider::InMemoryResourceStore;
    use serde_json::json;
    use warp::test;

    fn setup_test_api() -> ClaimApi {
        let store = InMemoryResourceStore::new();
        store.apply_namespace(
            Namespace::new("ns1", "local").with_label("support-group", "GP-PROJECT1"),
        );
        store.apply_access_control_entry(AccessControlEntry::new(
            ObjectMeta::new("ns1-acl-topic", "ns1", "local"),
            AccessControlEntrySpec {
                resource_type: ResourceType::Topic,
                resource: "project1.".to_string(),
                resource_pattern_type: ResourcePatternType::Prefixed,
                permission: Permission::Owner,
                granted_to: "ns1".to_string(),
            },
        ));

        let store = Arc::new(store);
        let metrics = ClaimMetrics::new().unwrap();
        let provider = AkhqClaimProvider::new(
            AkhqConfig {
                admin_group: "GP-ADMIN".to_string(),
                ..AkhqConfig::default()
            },
            vec!["local".to_string()],
            store.clone(),
            store,
        )
        .with_metrics(metrics.clone());

        ClaimApi::new(Arc::new(provider), metrics, ServerConfig::default())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let api = setup_test_api();

        let response = test::request()
            .method("GET")
            .path("/health")
            .reply(&api.routes())
            .await;

        assert_eq!(response.status(), 200);
        let body: HealthResponse = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_claim_v1_endpoint() {
        let api = setup_test_api();

        let response = test::request()
            .method("POST")
            .path("/akhq-claim")
            .json(&json!({"username": "user1", "groups": ["GP-PROJECT1"]}))
            .reply(&api.routes())
            .await;

        assert_eq!(response.status(), 200);
        let body: AkhqClaimResponse = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body.attributes["topicsFilterRegexp"], vec!["^project1\\..*$"]);
        assert_eq!(body.attributes["connectsFilterRegexp"], vec!["^none$"]);
        assert_eq!(body.attributes["consumerGroupsFilterRegexp"], vec!["^none$"]);
    }

    #[tokio::test]
    async fn test_claim_v2_null_and_empty_body() {
        let api = setup_test_api();

        for body in ["null", ""] {
            let response = test::request()
                .method("POST")
                .path("/akhq-claim/v2")
                .body(body)
                .reply(&api.routes())
                .await;

            assert_eq!(response.status(), 200);
            let claim: AkhqClaimResponseV2 = serde_json::from_slice(response.body()).unwrap();
            assert_eq!(claim.topics_filter_regexp, vec!["^none$"]);
            assert_eq!(claim.connects_filter_regexp, vec!["^none$"]);
            assert_eq!(claim.consumer_groups_filter_regexp, vec!["^none$"]);
            assert_eq!(claim.roles, AkhqConfig::default().former_roles);
        }
    }

    #[tokio::test]
    async fn test_claim_v3_endpoint() {
        let api = setup_test_api();

        let response = test::request()
            .method("POST")
            .path("/akhq-claim/v3")
            .json(&json!({"groups": ["GP-OTHER"]}))
            .reply(&api.routes())
            .await;

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body, json!({"groups": null}));

        let response = test::request()
            .method("POST")
            .path("/akhq-claim/v3")
            .json(&json!({"groups": ["GP-PROJECT1"]}))
            .reply(&api.routes())
            .await;

        let body: AkhqClaimResponseV3 = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body.group_list().len(), 2);
        assert_eq!(body.group_list()[0].clusters, vec!["^.*$"]);
    }

    #[tokio::test]
    async fn test_malformed_claim_request_is_deny_all() {
        let api = setup_test_api();

        for body in ["{not json", r#"{"groups": "GP-PROJECT1"}"#] {
            let response = test::request()
                .method("POST")
                .path("/akhq-claim/v2")
                .body(body)
                .reply(&api.routes())
                .await;

            assert_eq!(response.status(), 200);
            let claim: AkhqClaimResponseV2 = serde_json::from_slice(response.body()).unwrap();
            assert_eq!(claim.topics_filter_regexp, vec!["^none$"]);
            assert_eq!(claim.connects_filter_regexp, vec!["^none$"]);
            assert_eq!(claim.consumer_groups_filter_regexp, vec!["^none$"]);
            assert_eq!(claim.roles, AkhqConfig::default().former_roles);
        }

        let response = test::request()
            .method("POST")
            .path("/akhq-claim/v3")
            .body("{not json")
            .reply(&api.routes())
            .await;

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body, json!({"groups": null}));
    }

    #[tokio::test]
    async fn test_oversized_claim_request() {
        let api = setup_test_api();
        let groups: Vec<String> = (0..2000).map(|i| format!("GP-PROJECT-{:05}", i)).collect();

        let response = test::request()
            .method("POST")
            .path("/akhq-claim/v2")
            .json(&json!({"groups": groups}))
            .reply(&api.routes())
            .await;

        assert_eq!(response.status(), 413);
        let body: ApiResponse<()> = serde_json::from_slice(response.body()).unwrap();
        assert!(!body.success);
    }

    #[tokio::test]
    async fn test_unknown_route_and_method() {
        let api = setup_test_api();

        let response = test::request()
            .method("GET")
            .path("/akhq-claim/v9")
            .reply(&api.routes())
            .await;
        assert_eq!(response.status(), 404);

        let response = test::request()
            .method("GET")
            .path("/akhq-claim/v2")
            .reply(&api.routes())
            .await;
        assert_eq!(response.status(), 405);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_counts_claims() {
        let api = setup_test_api();

        test::request()
            .method("POST")
            .path("/akhq-claim/v3")
            .json(&json!({"groups": ["GP-ADMIN"]}))
            .reply(&api.routes())
            .await;

        let response = test::request()
            .method("GET")
            .path("/metrics")
            .reply(&api.routes())
            .await;

        assert_eq!(response.status(), 200);
        let body = String::from_utf8(response.body().to_vec()).unwrap();
        let line = body
            .lines()
            .find(|line| line.starts_with("akhq_claims_total{"))
            .unwrap();
        assert!(line.contains(r#"outcome="admin""#));
        assert!(line.contains(r#"version="v3""#));
        assert!(line.ends_with(" 1"));
    }
}
