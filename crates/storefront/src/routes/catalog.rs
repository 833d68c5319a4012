//! Read-only catalog: categories and products.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use sushi_delivery_core::CategoryId;

use super::path_product_id;
use crate::db::CatalogRepository;
use crate::error::{AppError, Result};
use crate::models::{Category, Product};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsQuery {
    pub category_id: Option<String>,
}

/// `GET /api/categories`
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CatalogRepository::new(state.pool())
        .list_categories()
        .await?;
    Ok(Json(categories))
}

/// `GET /api/products?categoryId=N`
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<Product>>> {
    let raw = query
        .category_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            AppError::Validation("categoryId query parameter is required".to_string())
        })?;
    let category_id = CategoryId::parse_positive(raw).ok_or_else(|| {
        AppError::Validation("categoryId must be a positive integer".to_string())
    })?;

    let products = CatalogRepository::new(state.pool())
        .list_products(category_id)
        .await?;
    Ok(Json(products))
}

/// `GET /api/products/{productId}`
pub async fn product(
    State(state): State<AppState>,
    Path(raw_product_id): Path<String>,
) -> Result<Json<Product>> {
    let product_id = path_product_id(&raw_product_id)?;

    CatalogRepository::new(state.pool())
        .get_product(product_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}
