//! Order persistence used by checkout.
//!
//! These run on a caller-supplied connection so checkout can compose them
//! inside one transaction.

use sqlx::PgConnection;

use sushi_delivery_core::{CartId, OrderId, Price, ProductId, Quantity, UserId};

use super::RepositoryError;
use crate::models::cart::{Cart, PricedLine};
use crate::models::order::{Order, OrderLine};

/// Lock a user's cart row for the rest of the transaction.
///
/// Returns `None` if the cart does not exist or belongs to someone else.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_cart(
    conn: &mut PgConnection,
    cart_id: CartId,
    user_id: UserId,
) -> Result<Option<Cart>, RepositoryError> {
    let cart = sqlx::query_as::<_, Cart>(
        r"
        SELECT id, user_id, created_at, updated_at
        FROM storefront.carts
        WHERE id = $1 AND user_id = $2
        FOR UPDATE
        ",
    )
    .bind(cart_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(cart)
}

/// Cart lines with the product's current price, in insertion order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn priced_lines(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Vec<PricedLine>, RepositoryError> {
    let lines = sqlx::query_as::<_, PricedLine>(
        r"
        SELECT cl.product_id, cl.quantity, p.price
        FROM storefront.cart_lines cl
        JOIN storefront.products p ON p.id = cl.product_id
        WHERE cl.cart_id = $1
        ORDER BY cl.id ASC
        ",
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await?;

    Ok(lines)
}

/// Insert an order with the column defaults: status `new`, payment `cash`/`pending`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    user_id: UserId,
    cart_id: CartId,
    total: Price,
) -> Result<Order, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(
        r"
        INSERT INTO storefront.orders (user_id, cart_id, total)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, cart_id, status, payment_method, payment_status,
                  total, placed_at, created_at, updated_at
        ",
    )
    .bind(user_id)
    .bind(cart_id)
    .bind(total)
    .fetch_one(conn)
    .await?;

    Ok(order)
}

/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_order_line(
    conn: &mut PgConnection,
    order_id: OrderId,
    product_id: ProductId,
    quantity: Quantity,
) -> Result<OrderLine, RepositoryError> {
    let line = sqlx::query_as::<_, OrderLine>(
        r"
        INSERT INTO storefront.order_lines (order_id, product_id, quantity)
        VALUES ($1, $2, $3)
        RETURNING id, order_id, product_id, quantity, created_at
        ",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity.get())
    .fetch_one(conn)
    .await?;

    Ok(line)
}

/// Delete every line of a cart, keeping the cart row. Returns lines removed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn clear_cart(conn: &mut PgConnection, cart_id: CartId) -> Result<u64, RepositoryError> {
    let removed = sqlx::query("DELETE FROM storefront.cart_lines WHERE cart_id = $1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    sqlx::query("UPDATE storefront.carts SET updated_at = NOW() WHERE id = $1")
        .bind(cart_id)
        .execute(conn)
        .await?;

    Ok(removed)
}
