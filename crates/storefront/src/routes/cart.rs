//! Cart handlers. All require a `client` or `admin` caller.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::Value;

use sushi_delivery_core::ProductId;

use super::{ApiJson, body_quantity, optional_json, path_product_id, positive_body_id};
use crate::error::Result;
use crate::middleware::RequireCustomer;
use crate::models::CartView;
use crate::services::CartService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemBody {
    pub product_id: Option<Value>,
    pub quantity: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DecrementBody {
    pub quantity: Option<Value>,
}

/// `GET /api/cart/me`
pub async fn my_cart(
    RequireCustomer(user): RequireCustomer,
    State(state): State<AppState>,
) -> Result<Json<CartView>> {
    let view = CartService::new(state.pool()).my_cart(user.id).await?;
    Ok(Json(view))
}

/// `POST /api/cart/items` with `{productId, quantity?}`
pub async fn add_item(
    RequireCustomer(user): RequireCustomer,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AddItemBody>,
) -> Result<Json<CartView>> {
    let product_id: ProductId = positive_body_id(body.product_id.as_ref(), "productId")?;
    let quantity = body_quantity(body.quantity.as_ref())?;

    let view = CartService::new(state.pool())
        .add_item(user.id, product_id, quantity)
        .await?;
    Ok(Json(view))
}

/// `PATCH /api/cart/items/{productId}/decrement` with optional `{quantity}`
pub async fn decrement_item(
    RequireCustomer(user): RequireCustomer,
    State(state): State<AppState>,
    Path(raw_product_id): Path<String>,
    body: Bytes,
) -> Result<Json<CartView>> {
    let product_id = path_product_id(&raw_product_id)?;
    let body: DecrementBody = optional_json(&body)?;
    let quantity = body_quantity(body.quantity.as_ref())?;

    let view = CartService::new(state.pool())
        .decrement_item(user.id, product_id, quantity)
        .await?;
    Ok(Json(view))
}

/// `DELETE /api/cart/items/{productId}`
pub async fn remove_item(
    RequireCustomer(user): RequireCustomer,
    State(state): State<AppState>,
    Path(raw_product_id): Path<String>,
) -> Result<Json<CartView>> {
    let product_id = path_product_id(&raw_product_id)?;

    let view = CartService::new(state.pool())
        .remove_item(user.id, product_id)
        .await?;
    Ok(Json(view))
}
