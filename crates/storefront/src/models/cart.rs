//! Cart domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sushi_delivery_core::{CartId, CartLineId, Price, ProductId, UserId};

/// A user's cart. Each user has at most one.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart line with the product's current price alongside the snapshot
/// taken when the line was last added to.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: CartLineId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    /// Price snapshot stored on the line.
    pub unit_price: Price,
    /// Current catalog price.
    pub price: Price,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart line as read during checkout: product, quantity, current price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Price,
}

/// Cart with its lines, the response of every cart endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub cart: Cart,
    pub items: Vec<CartLine>,
}
