//! Seed the storefront database with demo data.
//!
//! Upserts the three roles, one demo account per role, and a small catalog.
//! Running it again refreshes the same rows instead of duplicating them.

use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::info;

use sushi_delivery_core::{CategoryId, Email, ProductId, RoleCode, UserId};
use sushi_delivery_storefront::db::{self, users::ensure_role};
use sushi_delivery_storefront::services::auth::hash_password_blocking;

struct SeedUser {
    email: &'static str,
    full_name: &'static str,
    phone: &'static str,
    password: &'static str,
    roles: &'static [RoleCode],
}

struct SeedProduct {
    category: &'static str,
    name: &'static str,
    description: &'static str,
    /// Price in minor units (kopecks).
    price_minor: i64,
    weight_grams: i32,
    image_url: &'static str,
}

const USERS: [SeedUser; 3] = [
    SeedUser {
        email: "admin@sushi.local",
        full_name: "Administrator",
        phone: "+10000000001",
        password: "admin123",
        roles: &[RoleCode::Admin, RoleCode::Client],
    },
    SeedUser {
        email: "client@sushi.local",
        full_name: "Test Client",
        phone: "+10000000002",
        password: "client123",
        roles: &[RoleCode::Client],
    },
    SeedUser {
        email: "courier@sushi.local",
        full_name: "Test Courier",
        phone: "+10000000003",
        password: "courier123",
        roles: &[RoleCode::Courier],
    },
];

const CATEGORIES: [&str; 4] = ["Sets", "Rolls", "Sushi", "Drinks"];

const PRODUCTS: [SeedProduct; 4] = [
    SeedProduct {
        category: "Sets",
        name: "Philadelphia Set",
        description: "8 classic rolls with salmon and cream cheese.",
        price_minor: 129_000,
        weight_grams: 520,
        image_url: "https://images.example.com/set-philadelphia.jpg",
    },
    SeedProduct {
        category: "Rolls",
        name: "California with Crab",
        description: "Roll with crab meat, avocado and tobiko roe.",
        price_minor: 49_000,
        weight_grams: 240,
        image_url: "https://images.example.com/california-crab.jpg",
    },
    SeedProduct {
        category: "Sushi",
        name: "Salmon Nigiri",
        description: "A pair of classic nigiri with chilled salmon.",
        price_minor: 26_000,
        weight_grams: 90,
        image_url: "https://images.example.com/salmon-nigiri.jpg",
    },
    SeedProduct {
        category: "Drinks",
        name: "Green Tea",
        description: "Unsweetened green tea, 0.5 l bottle.",
        price_minor: 15_000,
        weight_grams: 500,
        image_url: "https://images.example.com/green-tea.jpg",
    },
];

/// Upsert roles, demo users and the catalog in one transaction.
///
/// # Errors
///
/// Returns an error if the database URL is missing or any upsert fails;
/// nothing is written in that case.
pub async fn demo_data() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url().ok_or("STOREFRONT_DATABASE_URL not set")?;

    let pool = db::create_pool(&database_url, 1).await?;
    info!("Connected to database");

    // Hash outside the transaction; Argon2 is slow.
    let mut hashes = Vec::with_capacity(USERS.len());
    for user in &USERS {
        hashes.push(hash_password_blocking(user.password.to_owned()).await?);
    }

    let mut tx = pool.begin().await?;

    for role in RoleCode::ALL {
        ensure_role(&mut *tx, role).await?;
    }
    info!(count = RoleCode::ALL.len(), "Roles seeded");

    for (user, password_hash) in USERS.iter().zip(&hashes) {
        let email = Email::parse(user.email)?;
        let user_id = upsert_user(&mut *tx, user, &email, password_hash).await?;
        for role in user.roles {
            let role_id = ensure_role(&mut *tx, *role).await?;
            sqlx::query(
                r"
                INSERT INTO storefront.user_roles (user_id, role_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(user_id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
        }
    }
    info!(count = USERS.len(), "Users seeded");

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for name in CATEGORIES {
        category_ids.push((name, upsert_category(&mut *tx, name).await?));
    }

    for product in &PRODUCTS {
        let category_id = category_ids
            .iter()
            .find(|(name, _)| *name == product.category)
            .map(|(_, id)| *id)
            .ok_or_else(|| format!("Category {:?} not seeded", product.category))?;
        upsert_product(&mut *tx, product, category_id).await?;
    }
    info!(
        categories = CATEGORIES.len(),
        products = PRODUCTS.len(),
        "Catalog seeded"
    );

    tx.commit().await?;
    pool.close().await;

    info!("Seed completed. Demo accounts:");
    for user in &USERS {
        info!("  {} / {}", user.email, user.password);
    }

    Ok(())
}

async fn upsert_user(
    conn: &mut PgConnection,
    user: &SeedUser,
    email: &Email,
    password_hash: &str,
) -> Result<UserId, sqlx::Error> {
    sqlx::query_scalar::<_, UserId>(
        r"
        INSERT INTO storefront.users (email, full_name, phone, password_hash)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name,
            phone = EXCLUDED.phone,
            password_hash = EXCLUDED.password_hash,
            updated_at = NOW()
        RETURNING id
        ",
    )
    .bind(email.as_str())
    .bind(user.full_name)
    .bind(user.phone)
    .bind(password_hash)
    .fetch_one(conn)
    .await
}

async fn upsert_category(conn: &mut PgConnection, name: &str) -> Result<CategoryId, sqlx::Error> {
    sqlx::query_scalar::<_, CategoryId>(
        r"
        INSERT INTO storefront.categories (name)
        VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET updated_at = NOW()
        RETURNING id
        ",
    )
    .bind(name)
    .fetch_one(conn)
    .await
}

async fn upsert_product(
    conn: &mut PgConnection,
    product: &SeedProduct,
    category_id: CategoryId,
) -> Result<ProductId, sqlx::Error> {
    sqlx::query_scalar::<_, ProductId>(
        r"
        INSERT INTO storefront.products
            (category_id, name, description, price, weight_grams, image_url)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (name) DO UPDATE
        SET category_id = EXCLUDED.category_id,
            description = EXCLUDED.description,
            price = EXCLUDED.price,
            weight_grams = EXCLUDED.weight_grams,
            image_url = EXCLUDED.image_url,
            updated_at = NOW()
        RETURNING id
        ",
    )
    .bind(category_id)
    .bind(product.name)
    .bind(product.description)
    .bind(Decimal::new(product.price_minor, 2))
    .bind(product.weight_grams)
    .bind(product.image_url)
    .fetch_one(conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_products_reference_seed_categories() {
        for product in &PRODUCTS {
            assert!(CATEGORIES.contains(&product.category), "{}", product.name);
        }
    }

    #[test]
    fn test_seed_users_are_valid() {
        for user in &USERS {
            assert!(Email::parse(user.email).is_ok(), "{}", user.email);
            assert!(user.password.len() >= 6);
            assert!(!user.roles.is_empty());
        }
    }

    #[test]
    fn test_every_role_has_a_demo_account() {
        for role in RoleCode::ALL {
            assert!(USERS.iter().any(|u| u.roles.contains(&role)), "{role}");
        }
    }
}
