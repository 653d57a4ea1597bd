use crate::adapters::http;
use crate::config::toml_config::ProviderSettings;
use crate::core::normalize;
use crate::domain::model::{ProviderId, ProviderRecord};
use crate::domain::ports::{CredentialState, LookupQuery, ProviderAdapter};
use crate::utils::error::ProviderFailure;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// CarQuery `getTrims`. Keyless, and only searchable by make/model/year,
/// so it runs after the decoders have produced an identity.
pub struct CarQueryAdapter {
    client: Client,
    settings: ProviderSettings,
}

impl CarQueryAdapter {
    pub fn new(client: Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl ProviderAdapter for CarQueryAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::CarQuery
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout()
    }

    fn credential(&self) -> CredentialState {
        CredentialState::NotRequired
    }

    fn needs_identity(&self) -> bool {
        true
    }

    async fn fetch(&self, query: &LookupQuery) -> Result<serde_json::Value, ProviderFailure> {
        let (Some(year), Some(make), Some(model)) = (query.year, &query.make, &query.model) else {
            return Err(ProviderFailure::not_found("trim lookup needs year, make and model"));
        };

        let url = http::endpoint(&self.settings, "/");
        tracing::debug!(
            provider = %self.provider(),
            vin = %query.vin,
            "Requesting trims for {} {} {}",
            year,
            make,
            model
        );

        let mut request = self
            .client
            .get(&url)
            .query(&[
                ("cmd", "getTrims".to_string()),
                ("make", make.to_lowercase()),
                ("model", model.clone()),
                ("year", year.to_string()),
            ])
            .timeout(self.timeout());
        if let Some(agent) = &self.settings.user_agent {
            request = request.header("User-Agent", agent);
        }

        http::get_json(request).await
    }

    fn normalize(
        &self,
        raw: serde_json::Value,
        query: &LookupQuery,
    ) -> Result<ProviderRecord, ProviderFailure> {
        normalize::carquery::normalize(&query.vin, raw)
    }
}
