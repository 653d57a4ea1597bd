//! HTTP surface: thin axum handlers over the aggregator.

use crate::core::aggregator::Aggregator;
use crate::domain::model::{CarProfile, Vin};
use crate::utils::error::{AggregationError, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
}

impl AppState {
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub vin: Vin,
    pub summary: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/cars/:vin", get(car_profile))
        .route("/cars/:vin/summary", get(car_summary))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

/// GET /health
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /cars/:vin
async fn car_profile(
    State(state): State<AppState>,
    Path(vin): Path<String>,
) -> std::result::Result<Json<CarProfile>, AggregationError> {
    let profile = state.aggregator.get_car_profile(&vin).await?;
    Ok(Json(profile))
}

/// GET /cars/:vin/summary
async fn car_summary(
    State(state): State<AppState>,
    Path(vin): Path<String>,
) -> std::result::Result<Json<SummaryResponse>, AggregationError> {
    let summary = state.aggregator.get_car_summary(&vin).await?;
    Ok(Json(SummaryResponse {
        vin: Vin::new(&vin),
        summary,
    }))
}

impl IntoResponse for AggregationError {
    fn into_response(self) -> Response {
        let status = match &self {
            AggregationError::VinNotFound { .. } => StatusCode::NOT_FOUND,
            AggregationError::AllProvidersUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AggregationError::MissingCredential { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
