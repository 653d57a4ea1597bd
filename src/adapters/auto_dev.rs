use crate::adapters::http;
use crate::config::toml_config::ProviderSettings;
use crate::core::normalize;
use crate::domain::model::{ProviderId, ProviderRecord};
use crate::domain::ports::{CredentialState, LookupQuery, ProviderAdapter};
use crate::utils::error::ProviderFailure;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// auto.dev VIN decode: `GET {base}/vin/{vin}` with a bearer token.
pub struct AutoDevAdapter {
    client: Client,
    settings: ProviderSettings,
}

impl AutoDevAdapter {
    pub fn new(client: Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl ProviderAdapter for AutoDevAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::AutoDev
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout()
    }

    fn credential(&self) -> CredentialState {
        http::credential_state(&self.settings, true)
    }

    async fn fetch(&self, query: &LookupQuery) -> Result<serde_json::Value, ProviderFailure> {
        let url = http::endpoint(&self.settings, &format!("vin/{}", query.vin));
        tracing::debug!(provider = %self.provider(), vin = %query.vin, "Requesting {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .timeout(self.timeout());
        if let Some(key) = self.settings.usable_api_key() {
            request = request.bearer_auth(key);
        }

        http::get_json(request).await
    }

    fn normalize(
        &self,
        raw: serde_json::Value,
        query: &LookupQuery,
    ) -> Result<ProviderRecord, ProviderFailure> {
        normalize::auto_dev::normalize(&query.vin, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Vin;
    use httpmock::prelude::*;

    fn adapter(server: &MockServer, key: Option<&str>) -> AutoDevAdapter {
        let mut settings = ProviderSettings::auto_dev().with_base_url(server.base_url());
        settings.api_key = key.map(str::to_string);
        AutoDevAdapter::new(Client::new(), settings)
    }

    fn query() -> LookupQuery {
        LookupQuery::for_vin(Vin::new("WP0AB2A99KS114523"))
    }

    #[tokio::test]
    async fn test_lookup_sends_bearer_token() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/vin/WP0AB2A99KS114523")
                .header("Authorization", "Bearer test-key");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "make": "Porsche",
                    "model": "911",
                    "trim": "Carrera S",
                    "vehicle": {"year": 2019}
                }));
        });

        let record = adapter(&server, Some("test-key")).lookup(&query()).await.unwrap();

        api_mock.assert();
        assert_eq!(record.year, Some(2019));
        assert_eq!(record.trim.as_deref(), Some("Carrera S"));
    }

    #[tokio::test]
    async fn test_rejected_key_is_unauthorized() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/vin/WP0AB2A99KS114523");
            then.status(401).json_body(serde_json::json!({"error": "invalid key"}));
        });

        let err = adapter(&server, Some("bad-key")).lookup(&query()).await.unwrap_err();

        api_mock.assert();
        assert_eq!(err, ProviderFailure::Unauthorized { status: 401 });
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/vin/WP0AB2A99KS114523");
            then.status(503);
        });

        let err = adapter(&server, Some("k")).lookup(&query()).await.unwrap_err();
        assert!(matches!(err, ProviderFailure::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_html_body_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/vin/WP0AB2A99KS114523");
            then.status(200).body("<html>maintenance</html>");
        });

        let err = adapter(&server, Some("k")).lookup(&query()).await.unwrap_err();
        assert!(matches!(err, ProviderFailure::MalformedResponse { .. }));
    }

    #[test]
    fn test_key_is_required_by_default() {
        let settings = ProviderSettings::auto_dev().with_base_url("http://localhost");
        let mut without_key = settings.clone();
        without_key.api_key = None;

        let adapter = AutoDevAdapter::new(Client::new(), without_key);
        assert_eq!(adapter.credential(), CredentialState::Missing);

        let adapter = AutoDevAdapter::new(Client::new(), settings.with_api_key("k"));
        assert_eq!(adapter.credential(), CredentialState::Present);
    }
}
