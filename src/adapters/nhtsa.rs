use crate::adapters::http;
use crate::config::toml_config::ProviderSettings;
use crate::core::normalize;
use crate::domain::model::{ProviderId, ProviderRecord};
use crate::domain::ports::{CredentialState, LookupQuery, ProviderAdapter};
use crate::utils::error::ProviderFailure;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// NHTSA vPIC `DecodeVinValues`. Public; a key is only sent (as the
/// `api_key` query parameter) when one is configured.
pub struct NhtsaAdapter {
    client: Client,
    settings: ProviderSettings,
}

impl NhtsaAdapter {
    pub fn new(client: Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl ProviderAdapter for NhtsaAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Nhtsa
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout()
    }

    fn credential(&self) -> CredentialState {
        http::credential_state(&self.settings, false)
    }

    async fn fetch(&self, query: &LookupQuery) -> Result<serde_json::Value, ProviderFailure> {
        let url = http::endpoint(&self.settings, &format!("DecodeVinValues/{}", query.vin));
        tracing::debug!(provider = %self.provider(), vin = %query.vin, "Requesting {}", url);

        let mut request = self
            .client
            .get(&url)
            .query(&[("format", "json")])
            .timeout(self.timeout());
        if let Some(year) = query.year {
            request = request.query(&[("modelyear", year.to_string())]);
        }
        if let Some(key) = self.settings.usable_api_key() {
            request = request.query(&[("api_key", key)]);
        }

        http::get_json(request).await
    }

    fn normalize(
        &self,
        raw: serde_json::Value,
        query: &LookupQuery,
    ) -> Result<ProviderRecord, ProviderFailure> {
        normalize::nhtsa::normalize(&query.vin, raw)
    }
}
