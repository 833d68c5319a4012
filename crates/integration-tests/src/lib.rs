//! Integration tests for Sushi Delivery.
//!
//! # Running Tests
//!
//! ```bash
//! # Point at a disposable database (migrations run automatically)
//! export DATABASE_URL=postgres://localhost/sushi_test
//!
//! # Run the database-backed tests
//! cargo test -p sushi-delivery-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `auth_flow` - Registration and login against real user rows
//! - `cart_ledger` - Cart line upserts, decrements and price snapshots
//! - `checkout` - Order placement, rollback and concurrent checkouts
//!
//! Fixtures use random suffixes so tests can share one database and run in
//! parallel.

#![allow(clippy::missing_panics_doc)]

use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;

use sushi_delivery_core::{CategoryId, Email, ProductId, RoleCode};
use sushi_delivery_storefront::db::{self, UserRepository, users::NewUser};
use sushi_delivery_storefront::models::User;
use sushi_delivery_storefront::services::TokenService;
use sushi_delivery_storefront::services::auth::hash_password_blocking;

/// Password given to every fixture user.
pub const FIXTURE_PASSWORD: &str = "fixture-pass";

/// Shared handles for one test.
pub struct TestContext {
    pub pool: PgPool,
    pub tokens: TokenService,
}

impl TestContext {
    /// Connect to `DATABASE_URL` and apply migrations.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map(SecretString::from)
            .expect("DATABASE_URL must be set for integration tests");

        let pool = db::create_pool(&database_url, 8)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("../storefront/migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let tokens = TokenService::new(
            SecretString::from("integration-test-signing-secret-0123456789"),
            Duration::from_secs(3600),
        );

        Self { pool, tokens }
    }

    /// A fresh email address nobody else uses.
    #[must_use]
    pub fn unique_email(prefix: &str) -> String {
        format!("{prefix}-{}@sushi.test", uuid::Uuid::new_v4().simple())
    }

    /// Create a user holding `roles`, with [`FIXTURE_PASSWORD`].
    pub async fn user(&self, roles: &[RoleCode]) -> User {
        let email = Email::parse(&Self::unique_email("user")).expect("valid fixture email");
        let password_hash = hash_password_blocking(FIXTURE_PASSWORD.to_owned())
            .await
            .expect("hash fixture password");

        UserRepository::new(&self.pool)
            .create(
                NewUser {
                    email: &email,
                    full_name: "Fixture User",
                    phone: None,
                    password_hash: &password_hash,
                },
                roles,
            )
            .await
            .expect("create fixture user")
    }

    /// Create a uniquely named category.
    pub async fn category(&self) -> CategoryId {
        sqlx::query_scalar::<_, CategoryId>(
            "INSERT INTO storefront.categories (name) VALUES ($1) RETURNING id",
        )
        .bind(format!("Category {}", uuid::Uuid::new_v4().simple()))
        .fetch_one(&self.pool)
        .await
        .expect("create fixture category")
    }

    /// Create a uniquely named product priced at `price_minor` kopecks.
    pub async fn product(&self, category_id: CategoryId, price_minor: i64) -> ProductId {
        sqlx::query_scalar::<_, ProductId>(
            r"
            INSERT INTO storefront.products (category_id, name, price)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(category_id)
        .bind(format!("Product {}", uuid::Uuid::new_v4().simple()))
        .bind(Decimal::new(price_minor, 2))
        .fetch_one(&self.pool)
        .await
        .expect("create fixture product")
    }

    /// Change a product's catalog price.
    pub async fn set_price(&self, product_id: ProductId, price_minor: i64) {
        sqlx::query("UPDATE storefront.products SET price = $2 WHERE id = $1")
            .bind(product_id)
            .bind(Decimal::new(price_minor, 2))
            .execute(&self.pool)
            .await
            .expect("update fixture price");
    }

    /// Number of orders placed by a user.
    pub async fn order_count(&self, user: &User) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM storefront.orders WHERE user_id = $1")
            .bind(user.id)
            .fetch_one(&self.pool)
            .await
            .expect("count orders")
    }
}
