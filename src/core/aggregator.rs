//! Fan-out over every provider adapter for one VIN, then a synchronous
//! precedence merge.
//!
//! Adapters that can look up by VIN run concurrently first. Adapters that
//! need a decoded year/make/model run concurrently in a second round keyed
//! by the merged identity. Each call carries its provider's timeout; a
//! timeout counts as `Unavailable` and never cancels the other calls.

use crate::adapters::{http, AutoDevAdapter, CarQueryAdapter, NhtsaAdapter};
use crate::config::toml_config::ServiceConfig;
use crate::core::merge::{self, PrecedencePolicy};
use crate::core::summarizer;
use crate::domain::model::{CarProfile, ProviderId, ProviderRecord, Vin};
use crate::domain::ports::{CredentialState, LookupQuery, ProviderAdapter};
use crate::utils::error::{AggregationError, ProviderFailure};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of one provider call.
#[derive(Debug, Clone)]
pub struct ProviderOutcome {
    pub provider: ProviderId,
    pub result: Result<ProviderRecord, ProviderFailure>,
}

/// A merged profile plus the per-provider failures that were recovered
/// while building it.
#[derive(Debug, Clone)]
pub struct AggregationReport {
    pub profile: CarProfile,
    pub contributors: Vec<ProviderId>,
    pub failures: Vec<(ProviderId, ProviderFailure)>,
}

pub struct Aggregator {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    policy: PrecedencePolicy,
}

impl Aggregator {
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>, policy: PrecedencePolicy) -> Self {
        Self { adapters, policy }
    }

    /// Wires the three HTTP adapters from configuration around one shared
    /// client.
    pub fn from_config(config: &ServiceConfig) -> crate::utils::error::Result<Self> {
        let client = http::build_client()?;
        let providers = &config.providers;
        let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![
            Arc::new(AutoDevAdapter::new(client.clone(), providers.auto_dev.clone())),
            Arc::new(NhtsaAdapter::new(client.clone(), providers.nhtsa.clone())),
            Arc::new(CarQueryAdapter::new(client, providers.carquery.clone())),
        ];
        Ok(Self::new(adapters, PrecedencePolicy::from_config(&config.precedence)))
    }

    pub async fn get_car_profile(&self, vin: &str) -> Result<CarProfile, AggregationError> {
        self.aggregate(vin).await.map(|report| report.profile)
    }

    pub async fn get_car_summary(&self, vin: &str) -> Result<String, AggregationError> {
        let profile = self.get_car_profile(vin).await?;
        Ok(summarizer::summarize(&profile))
    }

    /// Read-only and idempotent, so callers may simply call again to retry.
    pub async fn aggregate(&self, vin: &str) -> Result<AggregationReport, AggregationError> {
        let vin = Vin::new(vin);
        self.ensure_credentials()?;

        let started = Instant::now();
        let (direct, dependent): (Vec<_>, Vec<_>) = self
            .adapters
            .iter()
            .cloned()
            .partition(|adapter| !adapter.needs_identity());

        let vin_query = LookupQuery::for_vin(vin.clone());
        let mut outcomes = run_adapters(&direct, &vin_query).await;

        if !dependent.is_empty() {
            let decoded: Vec<ProviderRecord> = outcomes
                .iter()
                .filter_map(|outcome| outcome.result.as_ref().ok().cloned())
                .collect();
            let identity = merge::identity_query(&vin, &decoded, &self.policy);

            if identity.has_identity() {
                outcomes.extend(run_adapters(&dependent, &identity).await);
            } else {
                debug!(vin = %vin, "Skipping identity-keyed providers: year/make/model not decoded");
                outcomes.extend(dependent.iter().map(|adapter| ProviderOutcome {
                    provider: adapter.provider(),
                    result: Err(ProviderFailure::not_found("decoded year/make/model unavailable")),
                }));
            }
        }

        let mut records = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(record) => records.push(record),
                Err(failure) => failures.push((outcome.provider, failure)),
            }
        }

        if records.is_empty() {
            warn!(
                vin = %vin,
                failures = failures.len(),
                "No provider returned data"
            );
            return Err(no_profile(vin, failures));
        }

        let profile = merge::merge_records(&vin, &records, &self.policy);
        if !profile.has_full_identity() {
            warn!(
                vin = %vin,
                year = ?profile.year,
                make = ?profile.make,
                model = ?profile.model,
                "Decoded identity is incomplete"
            );
            return Err(no_profile(vin, failures));
        }
        let contributors: Vec<ProviderId> = records.iter().map(|record| record.provider).collect();

        info!(
            vin = %vin,
            contributors = ?contributors,
            failed = failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Car profile assembled"
        );

        Ok(AggregationReport {
            profile,
            contributors,
            failures,
        })
    }

    fn ensure_credentials(&self) -> Result<(), AggregationError> {
        for adapter in &self.adapters {
            if adapter.credential() == CredentialState::Missing {
                let provider = adapter.provider();
                warn!(provider = %provider, "Required credential is not configured");
                return Err(AggregationError::MissingCredential { provider });
            }
        }
        Ok(())
    }
}

/// A VIN counts as unknown only when every failure says so; any outage,
/// rejection or bad body means the answer might exist.
fn no_profile(vin: Vin, failures: Vec<(ProviderId, ProviderFailure)>) -> AggregationError {
    if failures.iter().all(|(_, failure)| failure.is_not_found()) {
        AggregationError::VinNotFound { vin }
    } else {
        AggregationError::AllProvidersUnavailable { vin, failures }
    }
}

/// Wait-for-all join: every adapter gets its own result slot, and a failure
/// in one never short-circuits the others.
async fn run_adapters(
    adapters: &[Arc<dyn ProviderAdapter>],
    query: &LookupQuery,
) -> Vec<ProviderOutcome> {
    join_all(adapters.iter().map(|adapter| run_adapter(adapter.as_ref(), query))).await
}

async fn run_adapter(adapter: &dyn ProviderAdapter, query: &LookupQuery) -> ProviderOutcome {
    let provider = adapter.provider();
    let limit = adapter.timeout();
    let started = Instant::now();

    let result = match tokio::time::timeout(limit, adapter.lookup(query)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderFailure::unavailable(format!(
            "timed out after {}s",
            limit.as_secs_f64()
        ))),
    };

    match &result {
        Ok(_) => debug!(
            provider = %provider,
            vin = %query.vin,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Provider lookup succeeded"
        ),
        Err(failure) => warn!(
            provider = %provider,
            vin = %query.vin,
            kind = failure.kind(),
            error = %failure,
            "Provider lookup failed"
        ),
    }

    ProviderOutcome { provider, result }
}
