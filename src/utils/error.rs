use crate::domain::model::{ProviderId, Vin};
use thiserror::Error;

/// Failure of a single provider call. Recovered by the aggregator as long as
/// another provider succeeds.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderFailure {
    #[error("credential rejected (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("no record for this VIN: {reason}")]
    NotFound { reason: String },

    #[error("rate limited (retry after {retry_after_seconds:?}s)")]
    RateLimited { retry_after_seconds: Option<u64> },

    #[error("provider unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("malformed response: {reason}")]
    MalformedResponse { reason: String },
}

impl ProviderFailure {
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound {
            reason: reason.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProviderFailure::Unauthorized { .. } => "unauthorized",
            ProviderFailure::NotFound { .. } => "not_found",
            ProviderFailure::RateLimited { .. } => "rate_limited",
            ProviderFailure::Unavailable { .. } => "unavailable",
            ProviderFailure::MalformedResponse { .. } => "malformed_response",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderFailure::NotFound { .. })
    }
}

/// Aggregate-level failure surfaced to callers of the aggregator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    #[error("no provider has a record for VIN {vin}")]
    VinNotFound { vin: Vin },

    #[error("all providers failed for VIN {vin}: {}", describe_failures(.failures))]
    AllProvidersUnavailable {
        vin: Vin,
        failures: Vec<(ProviderId, ProviderFailure)>,
    },

    #[error("missing credential for provider {provider}")]
    MissingCredential { provider: ProviderId },
}

impl AggregationError {
    pub fn kind(&self) -> &'static str {
        match self {
            AggregationError::VinNotFound { .. } => "vin_not_found",
            AggregationError::AllProvidersUnavailable { .. } => "all_providers_unavailable",
            AggregationError::MissingCredential { .. } => "missing_credential",
        }
    }
}

fn describe_failures(failures: &[(ProviderId, ProviderFailure)]) -> String {
    failures
        .iter()
        .map(|(provider, failure)| format!("{provider}: {failure}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Upstream,
    NotFound,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ServiceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ServiceError::Aggregation(AggregationError::VinNotFound { .. }) => ErrorCategory::NotFound,
            ServiceError::Aggregation(AggregationError::AllProvidersUnavailable { .. }) => {
                ErrorCategory::Upstream
            }
            ServiceError::Aggregation(AggregationError::MissingCredential { .. })
            | ServiceError::ConfigValidationError { .. }
            | ServiceError::InvalidConfigValueError { .. }
            | ServiceError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ServiceError::HttpClientError(_)
            | ServiceError::IoError(_)
            | ServiceError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::NotFound => ErrorSeverity::Low,
            ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ServiceError::Aggregation(AggregationError::VinNotFound { .. }) => {
                "Check the VIN for typos; none of the providers recognise it".to_string()
            }
            ServiceError::Aggregation(AggregationError::AllProvidersUnavailable { .. }) => {
                "Providers are unreachable or refusing requests; retry later".to_string()
            }
            ServiceError::Aggregation(AggregationError::MissingCredential { provider }) => {
                format!("Set the API key for '{}' in the config file or environment", provider)
            }
            ServiceError::HttpClientError(_) => {
                "Check TLS and proxy settings of the host".to_string()
            }
            ServiceError::IoError(_) => "Check that the file exists and is readable".to_string(),
            ServiceError::SerializationError(_) => {
                "Report this as a bug together with the VIN".to_string()
            }
            ServiceError::ConfigValidationError { field, .. }
            | ServiceError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}' in the configuration", field)
            }
            ServiceError::MissingConfigError { field } => {
                format!("Add '{}' to the configuration", field)
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::NotFound => format!("Vehicle not found: {}", self),
            ErrorCategory::Upstream => format!("Vehicle data providers unavailable: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::System => format!("Internal error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
