//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sushi_delivery_core::{Email, RoleCode, UserId};

use crate::services::auth::Claims;

/// A storefront account with its roles.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub phone: Option<String>,
    pub roles: Vec<RoleCode>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration request body.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    pub phone: Option<String>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .field("phone", &self.phone)
            .finish()
    }
}

/// Login request body.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful register/login response.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// Identity of the caller, taken from a verified bearer token.
///
/// Request-scoped: produced by the auth extractors and passed to services
/// explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub roles: Vec<RoleCode>,
}

impl CurrentUser {
    /// Whether the caller holds at least one of `allowed`.
    #[must_use]
    pub fn has_any_role(&self, allowed: &[RoleCode]) -> bool {
        self.roles.iter().any(|r| allowed.contains(r))
    }
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id,
            email: claims.email,
            roles: claims.roles,
        }
    }
}
