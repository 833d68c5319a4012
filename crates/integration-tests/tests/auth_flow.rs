//! Integration tests for registration and login.
//!
//! These tests need a `PostgreSQL` database at `DATABASE_URL`.

#![allow(clippy::unwrap_used)]

use sushi_delivery_core::RoleCode;
use sushi_delivery_integration_tests::{FIXTURE_PASSWORD, TestContext};
use sushi_delivery_storefront::models::{LoginRequest, Registration};
use sushi_delivery_storefront::services::{AuthError, AuthService};

fn registration(email: &str) -> Registration {
    Registration {
        email: email.to_owned(),
        password: "secret123".to_owned(),
        full_name: "  Test Client ".to_owned(),
        phone: Some("  ".to_owned()),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_register_then_login() {
    let ctx = TestContext::new().await;
    let auth = AuthService::new(&ctx.pool, &ctx.tokens);
    let email = TestContext::unique_email("Register");

    let session = auth.register(registration(&email)).await.unwrap();
    assert_eq!(session.user.email.as_str(), email.to_lowercase());
    assert_eq!(session.user.full_name, "Test Client");
    assert_eq!(session.user.phone, None);
    assert_eq!(session.user.roles, vec![RoleCode::Client]);

    let claims = ctx.tokens.verify(&session.token).unwrap();
    assert_eq!(claims.user_id, session.user.id);

    let login = auth
        .login(LoginRequest {
            email: email.to_uppercase(),
            password: "secret123".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(login.user.id, session.user.id);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_registration_conflicts() {
    let ctx = TestContext::new().await;
    let auth = AuthService::new(&ctx.pool, &ctx.tokens);
    let email = TestContext::unique_email("dup");

    auth.register(registration(&email)).await.unwrap();
    let err = auth.register(registration(&email)).await.unwrap_err();

    assert!(matches!(err, AuthError::UserAlreadyExists));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let ctx = TestContext::new().await;
    let auth = AuthService::new(&ctx.pool, &ctx.tokens);
    let user = ctx.user(&[RoleCode::Courier]).await;

    let wrong_password = auth
        .login(LoginRequest {
            email: user.email.as_str().to_owned(),
            password: "not-the-password".to_owned(),
        })
        .await
        .unwrap_err();
    assert!(matches!(wrong_password, AuthError::InvalidCredentials));

    let unknown = auth
        .login(LoginRequest {
            email: TestContext::unique_email("ghost"),
            password: FIXTURE_PASSWORD.to_owned(),
        })
        .await
        .unwrap_err();
    assert!(matches!(unknown, AuthError::InvalidCredentials));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_login_carries_all_roles() {
    let ctx = TestContext::new().await;
    let auth = AuthService::new(&ctx.pool, &ctx.tokens);
    let user = ctx.user(&[RoleCode::Courier, RoleCode::Admin]).await;

    let session = auth
        .login(LoginRequest {
            email: user.email.as_str().to_owned(),
            password: FIXTURE_PASSWORD.to_owned(),
        })
        .await
        .unwrap();

    assert_eq!(session.user.roles, vec![RoleCode::Admin, RoleCode::Courier]);
    let claims = ctx.tokens.verify(&session.token).unwrap();
    assert_eq!(claims.roles, vec![RoleCode::Admin, RoleCode::Courier]);
}
