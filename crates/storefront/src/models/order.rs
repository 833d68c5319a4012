//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sushi_delivery_core::{
    CartId, OrderId, OrderLineId, OrderStatus, PaymentMethod, PaymentStatus, Price, ProductId,
    UserId,
};

/// A placed order.
///
/// `user_id` and `cart_id` become null if the account or cart is deleted.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub cart_id: Option<CartId>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub total: Price,
    pub placed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderLine>,
}
