//! Cart service: the caller's cart plus its refreshed lines after each change.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use sushi_delivery_core::{ProductId, Quantity, UserId};

use crate::db::carts::AddOutcome;
use crate::db::{CartRepository, RepositoryError};
use crate::models::cart::CartView;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Product not found")]
    ProductNotFound,

    #[error("Cart item not found")]
    LineNotFound,

    #[error("quantity exceeds the maximum for a cart item")]
    QuantityLimit,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct CartService<'a> {
    carts: CartRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
        }
    }

    /// The user's cart, created empty on first access.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn my_cart(&self, user_id: UserId) -> Result<CartView, CartError> {
        self.refreshed(user_id).await
    }

    /// Add `quantity` of a product to the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product does not exist.
    /// Returns `CartError::QuantityLimit` if the line would overflow.
    #[instrument(skip_all, fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartView, CartError> {
        let cart = self.carts.get_or_create(user_id).await?;

        match self
            .carts
            .add_or_increment(cart.id, product_id, quantity)
            .await?
        {
            AddOutcome::Added => {}
            AddOutcome::ProductMissing => return Err(CartError::ProductNotFound),
            AddOutcome::QuantityLimit => return Err(CartError::QuantityLimit),
        }

        self.refreshed(user_id).await
    }

    /// Take `quantity` off a product's line, removing it at zero.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the product is not in the cart.
    #[instrument(skip_all, fields(user_id = %user_id, product_id = %product_id))]
    pub async fn decrement_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartView, CartError> {
        let cart = self.carts.get_or_create(user_id).await?;

        if !self.carts.decrement(cart.id, product_id, quantity).await? {
            return Err(CartError::LineNotFound);
        }

        self.refreshed(user_id).await
    }

    /// Remove a product's line entirely.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the product is not in the cart.
    #[instrument(skip_all, fields(user_id = %user_id, product_id = %product_id))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartView, CartError> {
        let cart = self.carts.get_or_create(user_id).await?;

        if !self.carts.remove(cart.id, product_id).await? {
            return Err(CartError::LineNotFound);
        }

        self.refreshed(user_id).await
    }

    /// Re-read the cart row so `updatedAt` reflects the last mutation.
    async fn refreshed(&self, user_id: UserId) -> Result<CartView, CartError> {
        let cart = self.carts.get_or_create(user_id).await?;
        let items = self.carts.list_lines(cart.id).await?;
        Ok(CartView { cart, items })
    }
}
