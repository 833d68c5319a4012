//! User repository for database operations.
//!
//! Accounts live in `storefront.users`; role codes are joined through
//! `storefront.user_roles`.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use sushi_delivery_core::{Email, RoleCode, RoleId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::user::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    full_name: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl UserRow {
    fn into_user(self, roles: Vec<RoleCode>) -> Result<User, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(User {
            id: self.id,
            email,
            full_name: self.full_name,
            phone: self.phone,
            roles,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Fields for a new account.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub email: &'a Email,
    pub full_name: &'a str,
    pub phone: Option<&'a str>,
    pub password_hash: &'a str,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user and their stored password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored email or role codes are invalid.
    pub async fn find_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT id, email, full_name, phone, password_hash, created_at, updated_at
            FROM storefront.users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut conn = self.pool.acquire().await?;
        let roles = roles_for(&mut *conn, row.user.id).await?;
        let user = row.user.into_user(roles)?;

        Ok(Some((user, row.password_hash)))
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored email or role codes are invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, full_name, phone, created_at, updated_at
            FROM storefront.users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut conn = self.pool.acquire().await?;
        let roles = roles_for(&mut *conn, row.id).await?;
        row.into_user(roles).map(Some)
    }

    /// Create a user and grant `roles`, in one transaction.
    ///
    /// Missing role rows are created on the fly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        new_user: NewUser<'_>,
        roles: &[RoleCode],
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO storefront.users (email, full_name, phone, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, full_name, phone, created_at, updated_at
            ",
        )
        .bind(new_user.email.as_str())
        .bind(new_user.full_name)
        .bind(new_user.phone)
        .bind(new_user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        for role in roles {
            let role_id = ensure_role(&mut *tx, *role).await?;
            sqlx::query(
                r"
                INSERT INTO storefront.user_roles (user_id, role_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(row.id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let mut granted = roles.to_vec();
        granted.sort_by_key(RoleCode::code);
        granted.dedup();
        row.into_user(granted)
    }
}

/// Get or create the role row for `role`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the upsert fails.
pub async fn ensure_role(conn: &mut PgConnection, role: RoleCode) -> Result<RoleId, RepositoryError> {
    let id = sqlx::query_scalar::<_, RoleId>(
        r"
        INSERT INTO storefront.roles (code, name)
        VALUES ($1, $2)
        ON CONFLICT (code) DO UPDATE SET code = EXCLUDED.code
        RETURNING id
        ",
    )
    .bind(role.code())
    .bind(role.display_name())
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// Role codes held by a user, ordered by code.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if a stored code is unknown.
pub async fn roles_for(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<RoleCode>, RepositoryError> {
    let codes = sqlx::query_scalar::<_, String>(
        r"
        SELECT r.code
        FROM storefront.user_roles ur
        JOIN storefront.roles r ON r.id = ur.role_id
        WHERE ur.user_id = $1
        ORDER BY r.code
        ",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    codes
        .iter()
        .map(|code| {
            code.parse::<RoleCode>()
                .map_err(|e| RepositoryError::DataCorruption(e.to_string()))
        })
        .collect()
}
