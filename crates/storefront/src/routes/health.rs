//! Health check.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

const SERVICE_NAME: &str = "sushi-delivery-backend";

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub database: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// `GET /api/health`
///
/// Pings the database; answers 503 when it is unreachable.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let (code, status, database) = match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => (StatusCode::OK, "ok", "up"),
        Err(e) => {
            tracing::warn!(error = %e, "Health check database ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, "error", "down")
        }
    };

    (
        code,
        Json(HealthReport {
            status,
            service: SERVICE_NAME,
            database,
            timestamp: Utc::now(),
        }),
    )
}
