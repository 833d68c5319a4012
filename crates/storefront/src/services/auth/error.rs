//! Authentication error types.

use thiserror::Error;

use super::password::PasswordHashError;
use super::token::TokenError;
use crate::db::RepositoryError;

/// Errors that can occur during registration and login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] sushi_delivery_core::EmailError),

    /// Required field missing or blank.
    #[error("{0}")]
    MissingFields(&'static str),

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error: {0}")]
    PasswordHash(#[from] PasswordHashError),

    /// Token could not be issued.
    #[error("token issue error: {0}")]
    Token(#[from] TokenError),
}
