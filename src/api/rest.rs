use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::collector::Collector;
use crate::model::{Service, Snapshot};

/// Shared application state for all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<Collector>,
}

#[derive(Debug, Serialize, Deserialize, async_graphql::SimpleObject)]
pub struct Health {
    pub status: String,
    pub version: String,
}

impl Health {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SnapshotParams {
    /// Seconds to divide counter deltas by instead of the time since the
    /// previous sample.
    pub interval: Option<f64>,
}

/// An interval must be a positive number of seconds.
pub fn validate_interval(interval: Option<f64>) -> Result<Option<f64>, String> {
    match interval {
        Some(secs) if !secs.is_finite() || secs <= 0.0 => {
            Err(format!("interval must be a positive number of seconds, got {}", secs))
        }
        other => Ok(other),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/snapshot", get(snapshot))
        .route("/api/v1/services", get(services))
        .with_state(state)
}

async fn health() -> Json<Health> {
    Json(Health::ok())
}

/// Collect and return a fresh snapshot. Every request triggers collection.
async fn snapshot(
    State(state): State<AppState>,
    Query(params): Query<SnapshotParams>,
) -> Result<Json<Snapshot>, (StatusCode, String)> {
    let interval =
        validate_interval(params.interval).map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    Ok(Json(state.collector.collect_with(interval).await))
}

async fn services(State(state): State<AppState>) -> Json<Vec<Service>> {
    Json(state.collector.services().await)
}
