//! Order placement.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::Value;

use sushi_delivery_core::CartId;

use super::{ApiJson, positive_body_id};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireCustomer;
use crate::models::PlacedOrder;
use crate::services::CheckoutPipeline;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    pub cart_id: Option<Value>,
}

/// `POST /api/orders` with `{cartId}`: check out the caller's cart.
pub async fn create(
    RequireCustomer(user): RequireCustomer,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateOrderBody>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let cart_id: CartId = positive_body_id(body.cart_id.as_ref(), "cartId")?;

    let placed = CheckoutPipeline::new(state.pool())
        .place_order(user.id, cart_id)
        .await?;

    let order_id = placed.order.id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));

    Ok((StatusCode::CREATED, Json(placed)))
}
