use crate::akhq::types::{ClaimOutcome, ClaimVersion};
use crate::Result;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

pub struct ClaimMetrics {
    pub claims: IntCounterVec,
    pub claim_errors: IntCounterVec,
    pub registry: Registry,
}

impl ClaimMetrics {
    pub fn new() -> Result<Arc<Self>> {
        let registry = Registry::new();

        let claims = IntCounterVec::new(
            Opts::new("akhq_claims_total", "Total number of AKHQ claims generated"),
            &["version", "outcome"],
        )?;

        let claim_errors = IntCounterVec::new(
            Opts::new(
                "akhq_claim_errors_total",
                "Total number of AKHQ claim requests that failed",
            ),
            &["version"],
        )?;

        registry.register(Box::new(claims.clone()))?;
        registry.register(Box::new(claim_errors.clone()))?;

        Ok(Arc::new(Self {
            claims,
            claim_errors,
            registry,
        }))
    }

    pub fn record_claim(&self, version: ClaimVersion, outcome: ClaimOutcome) {
        self.claims
            .with_label_values(&[version.as_str(), outcome.as_str()])
            .inc();
    }

    pub fn record_error(&self, version: ClaimVersion) {
        self.claim_errors
            .with_label_values(&[version.as_str()])
            .inc();
    }

    /// Render the registry in the Prometheus text exposition format
    pub fn encode(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
