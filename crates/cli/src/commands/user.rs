//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! sushi-cli user create -e courier2@sushi.local -n "Second Courier" -p secret123 -r courier
//! sushi-cli user create -e boss@sushi.local -n "Boss" -p secret123 -r admin,client
//! ```

use thiserror::Error;

use sushi_delivery_core::{Email, EmailError, RoleCode, UserId};
use sushi_delivery_storefront::db::{self, RepositoryError, UserRepository, users::NewUser};
use sushi_delivery_storefront::services::auth::{PasswordHashError, hash_password_blocking};

/// Minimum password length, in characters.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Missing environment variable: STOREFRONT_DATABASE_URL or DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Full name must not be empty")]
    EmptyName,

    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    #[error("At least one role is required")]
    NoRoles,

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("Database error: {0}")]
    Repository(RepositoryError),

    #[error("Password hashing failed: {0}")]
    PasswordHash(#[from] PasswordHashError),
}

/// Create a user holding `roles`.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `UserError` on invalid input, a duplicate email, or a database
/// failure.
pub async fn create(
    email: &str,
    full_name: &str,
    password: String,
    phone: Option<&str>,
    roles: &[RoleCode],
) -> Result<UserId, UserError> {
    let email = Email::parse(email)?;
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(UserError::EmptyName);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(UserError::WeakPassword);
    }
    if roles.is_empty() {
        return Err(UserError::NoRoles);
    }

    let database_url = super::database_url().ok_or(UserError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url, 1).await?;

    let password_hash = hash_password_blocking(password).await?;
    let phone = phone.map(str::trim).filter(|p| !p.is_empty());

    let created = UserRepository::new(&pool)
        .create(
            NewUser {
                email: &email,
                full_name,
                phone,
                password_hash: &password_hash,
            },
            roles,
        )
        .await;
    pool.close().await;

    let user = created.map_err(|e| match e {
        RepositoryError::Conflict(_) => UserError::UserExists(email.as_str().to_owned()),
        other => UserError::Repository(other),
    })?;

    let granted = user
        .roles
        .iter()
        .map(RoleCode::code)
        .collect::<Vec<_>>()
        .join(",");
    tracing::info!(
        user_id = user.id.as_i32(),
        email = %user.email,
        roles = %granted,
        "User created"
    );

    Ok(user.id)
}
