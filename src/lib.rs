pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use api::{build_router, AppState};
pub use config::ServiceConfig;
pub use core::aggregator::{AggregationReport, Aggregator};
pub use core::summarizer::summarize;
pub use domain::model::{CarProfile, ProviderId, Vin};
pub use utils::error::{AggregationError, ProviderFailure, Result, ServiceError};
