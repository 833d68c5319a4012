//! Authentication service.
//!
//! Password accounts with bearer tokens. Passwords are stored as
//! `hex(salt):hex(argon2 key)`; tokens are HMAC-SHA256 signed and verified
//! without any storage lookup.

mod codec;
mod error;
mod password;
mod token;

pub use error::AuthError;
pub use password::{
    PasswordHashError, hash_password, hash_password_blocking, verify_password,
    verify_password_blocking,
};
pub use token::{Claims, DurationError, TokenError, TokenService, parse_duration};

use sqlx::PgPool;
use tracing::instrument;

use sushi_delivery_core::{Email, RoleCode};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::models::user::{AuthSession, LoginRequest, Registration, User};

/// Minimum password length, in characters.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Registration and login.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenService) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    /// Register a customer account and sign them in.
    ///
    /// New accounts always receive the `client` role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if email, password or name is blank.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip_all, fields(email = %registration.email))]
    pub async fn register(&self, registration: Registration) -> Result<AuthSession, AuthError> {
        let full_name = registration.full_name.trim();
        if registration.email.trim().is_empty()
            || registration.password.is_empty()
            || full_name.is_empty()
        {
            return Err(AuthError::MissingFields(
                "email, password and fullName are required",
            ));
        }

        validate_password(&registration.password)?;
        let email = Email::parse(&registration.email)?;
        let phone = registration
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());

        let password_hash = hash_password_blocking(registration.password).await?;

        let user = self
            .users
            .create(
                NewUser {
                    email: &email,
                    full_name,
                    phone,
                    password_hash: &password_hash,
                },
                &[RoleCode::Client],
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        self.session_for(user)
    }

    /// Sign in with email and password.
    ///
    /// Unknown emails and wrong passwords produce the same error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if email or password is blank.
    /// Returns `AuthError::InvalidCredentials` if the credentials don't match.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, AuthError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AuthError::MissingFields("email and password are required"));
        }

        let Ok(email) = Email::parse(&request.email) else {
            return Err(reject_unknown(request.password).await);
        };

        let Some((user, password_hash)) = self.users.find_with_password(&email).await? else {
            return Err(reject_unknown(request.password).await);
        };

        if !verify_password_blocking(request.password, password_hash).await? {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        self.session_for(user)
    }

    fn session_for(&self, user: User) -> Result<AuthSession, AuthError> {
        let token = self.tokens.issue(user.id, &user.email, &user.roles)?;
        Ok(AuthSession { token, user })
    }
}

/// Spend the same Argon2 work as a real mismatch, then reject.
async fn reject_unknown(password: String) -> AuthError {
    match verify_password_blocking(password, password::UNMATCHABLE_HASH.to_owned()).await {
        Ok(_) => AuthError::InvalidCredentials,
        Err(e) => e.into(),
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
