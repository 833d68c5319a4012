//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`,
//! and every error renders as `{"error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::{AuthError, TokenError};
use crate::services::cart::CartError;
use crate::services::checkout::CheckoutError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Registration or login failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Bearer token rejected.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Request input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code and client-facing message.
    ///
    /// Server-side failures never expose their details.
    fn status_and_message(&self) -> (StatusCode, String) {
        let internal = || (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string());

        match self {
            Self::Database(RepositoryError::Conflict(msg)) => (StatusCode::CONFLICT, msg.clone()),
            Self::Database(RepositoryError::NotFound) => {
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            Self::Database(_) | Self::Internal(_) => internal(),
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_) => {
                    (StatusCode::BAD_REQUEST, "Invalid email address".to_string())
                }
                AuthError::MissingFields(msg) => (StatusCode::BAD_REQUEST, (*msg).to_string()),
                AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
                }
                AuthError::UserAlreadyExists => (
                    StatusCode::CONFLICT,
                    "User with this email already exists".to_string(),
                ),
                AuthError::Repository(_) | AuthError::PasswordHash(_) | AuthError::Token(_) => {
                    internal()
                }
            },
            Self::Token(TokenError::Signing) => internal(),
            Self::Token(_) => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            Self::Cart(err) => match err {
                CartError::ProductNotFound | CartError::LineNotFound => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                CartError::QuantityLimit => (StatusCode::BAD_REQUEST, err.to_string()),
                CartError::Repository(_) => internal(),
            },
            Self::Checkout(err) => match err {
                CheckoutError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, (*msg).to_string()),
                CheckoutError::CartNotFound => (StatusCode::NOT_FOUND, err.to_string()),
                CheckoutError::EmptyCart => (StatusCode::BAD_REQUEST, err.to_string()),
                CheckoutError::TotalOverflow | CheckoutError::Repository { .. } => internal(),
            },
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
