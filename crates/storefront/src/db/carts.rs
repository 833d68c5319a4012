//! Cart ledger: one cart per user, one line per product.
//!
//! Every mutation runs in its own short transaction whose first statement
//! touches `carts.updated_at`, so the cart row is always locked before any
//! of its lines. Checkout locks in the same order. Adding a product
//! refreshes the line's `unit_price` snapshot to the current catalog price.

use sqlx::{PgConnection, PgPool};

use sushi_delivery_core::{CartId, ProductId, Quantity, UserId};

use super::RepositoryError;
use crate::models::cart::{Cart, CartLine};

/// Largest quantity a single line can hold (`int4` max).
pub const MAX_LINE_QUANTITY: i32 = i32::MAX;

/// Result of [`CartRepository::add_or_increment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    ProductMissing,
    /// The line would exceed [`MAX_LINE_QUANTITY`]; nothing changed.
    QuantityLimit,
}

/// Repository for cart and cart line operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Return the user's cart, creating an empty one if they have none.
    ///
    /// Concurrent first calls for the same user converge on one cart: the
    /// loser of the insert race reads the winner's row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let inserted = sqlx::query_as::<_, Cart>(
            r"
            INSERT INTO storefront.carts (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING id, user_id, created_at, updated_at
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        if let Some(cart) = inserted {
            tracing::debug!(cart_id = %cart.id, user_id = %user_id, "Cart created");
            return Ok(cart);
        }

        sqlx::query_as::<_, Cart>(
            r"
            SELECT id, user_id, created_at, updated_at
            FROM storefront.carts
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Lines of a cart with current product prices, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT cl.id, cl.cart_id, cl.product_id, cl.unit_price, p.price,
                   cl.quantity, cl.created_at, cl.updated_at
            FROM storefront.cart_lines cl
            JOIN storefront.products p ON p.id = cl.product_id
            WHERE cl.cart_id = $1
            ORDER BY cl.created_at ASC, cl.id ASC
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// Add `quantity` of a product, creating the line or incrementing it.
    ///
    /// The line's price snapshot is set to the product's current price.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn add_or_increment(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<AddOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        touch_cart(&mut *tx, cart_id).await?;

        let line = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO storefront.cart_lines AS cl (cart_id, product_id, unit_price, quantity)
            SELECT $1, p.id, p.price, $3
            FROM storefront.products p
            WHERE p.id = $2
            ON CONFLICT (cart_id, product_id) DO UPDATE
            SET quantity = cl.quantity + EXCLUDED.quantity,
                unit_price = EXCLUDED.unit_price,
                updated_at = NOW()
            WHERE cl.quantity <= $4 - EXCLUDED.quantity
            RETURNING cl.id
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity.get())
        .bind(MAX_LINE_QUANTITY)
        .fetch_optional(&mut *tx)
        .await?;

        if line.is_some() {
            tx.commit().await?;
            return Ok(AddOutcome::Added);
        }

        // No row: either the product is unknown or the guard refused the sum.
        let product_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM storefront.products WHERE id = $1)",
        )
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.rollback().await?;

        Ok(if product_exists {
            AddOutcome::QuantityLimit
        } else {
            AddOutcome::ProductMissing
        })
    }

    /// Take `quantity` off a line, deleting it when nothing would remain.
    ///
    /// Returns whether the line existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn decrement(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        touch_cart(&mut *tx, cart_id).await?;

        let current = sqlx::query_scalar::<_, i32>(
            r"
            SELECT quantity
            FROM storefront.cart_lines
            WHERE cart_id = $1 AND product_id = $2
            FOR UPDATE
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            tx.rollback().await?;
            return Ok(false);
        };

        let remaining = current.saturating_sub(quantity.get());
        if remaining <= 0 {
            sqlx::query(
                r"
                DELETE FROM storefront.cart_lines
                WHERE cart_id = $1 AND product_id = $2
                ",
            )
            .bind(cart_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                r"
                UPDATE storefront.cart_lines
                SET quantity = $3, updated_at = NOW()
                WHERE cart_id = $1 AND product_id = $2
                ",
            )
            .bind(cart_id)
            .bind(product_id)
            .bind(remaining)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(true)
    }

    /// Delete a product's line. Returns whether a line was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn remove(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        touch_cart(&mut *tx, cart_id).await?;

        let deleted = sqlx::query(
            r"
            DELETE FROM storefront.cart_lines
            WHERE cart_id = $1 AND product_id = $2
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;

        Ok(true)
    }
}

/// Bump `updated_at`, taking the cart row lock for the rest of the transaction.
async fn touch_cart(conn: &mut PgConnection, cart_id: CartId) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE storefront.carts SET updated_at = NOW() WHERE id = $1")
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(())
}
