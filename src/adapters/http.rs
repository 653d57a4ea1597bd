use crate::config::toml_config::ProviderSettings;
use crate::domain::ports::CredentialState;
use crate::utils::error::{ProviderFailure, Result};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// One client shared by every adapter; per-provider timeouts are applied
/// per request.
pub fn build_client() -> Result<Client> {
    let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
    Ok(client)
}

/// Sends the request and returns the decoded JSON body. Every non-success
/// path is mapped onto a `ProviderFailure`; nothing else escapes.
pub async fn get_json(request: RequestBuilder) -> std::result::Result<serde_json::Value, ProviderFailure> {
    let response = request.send().await.map_err(transport_failure)?;
    let status = response.status();
    tracing::debug!("Provider response status: {}", status);

    if !status.is_success() {
        return Err(classify_status(status, retry_after_seconds(&response)));
    }

    let body = response.text().await.map_err(transport_failure)?;
    serde_json::from_str(&body)
        .map_err(|e| ProviderFailure::malformed(format!("body is not valid JSON: {e}")))
}

pub fn classify_status(status: StatusCode, retry_after_seconds: Option<u64>) -> ProviderFailure {
    match status.as_u16() {
        401..=403 => ProviderFailure::Unauthorized {
            status: status.as_u16(),
        },
        400 | 404 | 410 | 422 => {
            ProviderFailure::not_found(format!("provider answered HTTP {}", status.as_u16()))
        }
        429 => ProviderFailure::RateLimited {
            retry_after_seconds,
        },
        _ => ProviderFailure::unavailable(format!("provider answered HTTP {}", status.as_u16())),
    }
}

fn retry_after_seconds(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

fn transport_failure(err: reqwest::Error) -> ProviderFailure {
    if err.is_timeout() {
        ProviderFailure::unavailable("request timed out")
    } else if err.is_connect() {
        ProviderFailure::unavailable(format!("connection failed: {err}"))
    } else if err.is_decode() {
        ProviderFailure::malformed(format!("could not read body: {err}"))
    } else {
        ProviderFailure::unavailable(err.to_string())
    }
}

pub fn credential_state(settings: &ProviderSettings, required_by_default: bool) -> CredentialState {
    if settings.usable_api_key().is_some() {
        CredentialState::Present
    } else if settings.credential_required.unwrap_or(required_by_default) {
        CredentialState::Missing
    } else {
        CredentialState::NotRequired
    }
}

pub fn endpoint(settings: &ProviderSettings, path: &str) -> String {
    format!("{}/{}", settings.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
