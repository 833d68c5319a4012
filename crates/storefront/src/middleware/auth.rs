//! Bearer token extractors.
//!
//! Handlers take the caller's identity as an argument:
//!
//! ```rust,ignore
//! async fn my_cart(
//!     State(state): State<AppState>,
//!     RequireCustomer(user): RequireCustomer,
//! ) -> Result<Json<CartView>> {
//!     // ...
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use sushi_delivery_core::RoleCode;

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Roles allowed to use the cart and place orders.
const CUSTOMER_ROLES: [RoleCode; 2] = [RoleCode::Client, RoleCode::Admin];

/// Extractor that requires a valid bearer token.
///
/// Rejects with `401 Unauthorized` when the header is missing, not a
/// `Bearer` credential, or the token fails verification.
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(unauthorized)?;

        let claims = state.tokens().verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            AppError::from(e)
        })?;

        let user = CurrentUser::from(claims);
        set_sentry_user(&user.id, Some(user.email.as_str()));

        Ok(Self(user))
    }
}

/// Extractor that requires a verified caller holding `client` or `admin`.
///
/// Rejects with `403 Forbidden` for other roles (e.g. couriers).
pub struct RequireCustomer(pub CurrentUser);

impl FromRequestParts<AppState> for RequireCustomer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        if !user.has_any_role(&CUSTOMER_ROLES) {
            tracing::debug!(user_id = %user.id, roles = ?user.roles, "Role check failed");
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }

        Ok(Self(user))
    }
}

fn unauthorized() -> AppError {
    AppError::Unauthorized("Unauthorized".to_string())
}

/// The token of an `Authorization: Bearer <token>` header, if present.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/cart/me");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def.ghi"))), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&parts_with(Some("Bearer   abc  "))), Some("abc"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        assert_eq!(bearer_token(&parts_with(None)), None);
        assert_eq!(bearer_token(&parts_with(Some("Basic dXNlcjpwYXNz"))), None);
        assert_eq!(bearer_token(&parts_with(Some("bearer abc"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
    }
}
