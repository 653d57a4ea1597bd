use crate::domain::model::{ProviderId, ProviderRecord, Vin};
use crate::utils::error::ProviderFailure;
use async_trait::async_trait;
use std::time::Duration;

/// Keys passed to a provider lookup. Identity keys are only filled in for
/// adapters that cannot look up by VIN alone.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupQuery {
    pub vin: Vin,
    pub year: Option<u16>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub trim: Option<String>,
}

impl LookupQuery {
    pub fn for_vin(vin: Vin) -> Self {
        Self {
            vin,
            year: None,
            make: None,
            model: None,
            trim: None,
        }
    }

    pub fn has_identity(&self) -> bool {
        self.year.is_some() && self.make.is_some() && self.model.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    NotRequired,
    Present,
    Missing,
}

/// One external data source behind a uniform contract.
///
/// `fetch` performs exactly one outbound call and never retries.
/// `normalize` is pure and maps the raw body into a `ProviderRecord`.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> ProviderId;

    fn timeout(&self) -> Duration;

    fn credential(&self) -> CredentialState;

    /// Whether this provider needs decoded year/make/model to be queried.
    fn needs_identity(&self) -> bool {
        false
    }

    async fn fetch(&self, query: &LookupQuery) -> Result<serde_json::Value, ProviderFailure>;

    fn normalize(
        &self,
        raw: serde_json::Value,
        query: &LookupQuery,
    ) -> Result<ProviderRecord, ProviderFailure>;

    async fn lookup(&self, query: &LookupQuery) -> Result<ProviderRecord, ProviderFailure> {
        let raw = self.fetch(query).await?;
        self.normalize(raw, query)
    }
}
