//! Registration and login handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use super::ApiJson;
use crate::error::{Result, add_breadcrumb};
use crate::models::{AuthSession, LoginRequest, Registration};
use crate::services::AuthService;
use crate::state::AppState;

/// `POST /api/auth/register`
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(registration): ApiJson<Registration>,
) -> Result<(StatusCode, Json<AuthSession>)> {
    let session = AuthService::new(state.pool(), state.tokens())
        .register(registration)
        .await?;

    add_breadcrumb("auth", "Registered", None);
    Ok((StatusCode::CREATED, Json(session)))
}

/// `POST /api/auth/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthSession>> {
    let session = AuthService::new(state.pool(), state.tokens())
        .login(request)
        .await?;

    add_breadcrumb("auth", "Logged in", None);
    Ok(Json(session))
}
