//! Health check endpoints for liveness and readiness probes.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::db;
use crate::errors::{ApiResponse, AppError};
use crate::AppState;

/// Readiness probe detail.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub database: String,
}

/// GET / — service banner.
pub async fn root() -> Json<ApiResponse<HealthStatus>> {
    ApiResponse::success(HealthStatus {
        status: "ok".to_string(),
        database: "unchecked".to_string(),
    })
}

/// Liveness probe — always returns OK if the process is running.
pub async fn live() -> &'static str {
    "OK"
}

/// Readiness probe — checks MongoDB connectivity.
pub async fn ready(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let database = match db::ping(&state.db).await {
        Ok(()) => "connected".to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            format!("error: {e}")
        }
    };

    ApiResponse::success(HealthStatus {
        status: "ok".to_string(),
        database,
    })
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("API endpoint not found. Please check the URL.".to_string())
}
