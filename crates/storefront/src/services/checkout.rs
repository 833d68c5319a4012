//! Checkout: turn a cart into an order in a single transaction.
//!
//! ```text
//! Start -> CartVerified -> LinesLoaded -> Priced -> OrderPersisted
//!       -> LinesPersisted -> CartCleared -> Committed
//! ```
//!
//! The cart row is locked with `SELECT ... FOR UPDATE` first, so concurrent
//! checkouts of one cart run one after another. The second one finds the
//! cart already emptied and fails with [`CheckoutError::EmptyCart`].

use std::fmt;

use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use tracing::instrument;

use sushi_delivery_core::{CartId, Price, Quantity, UserId};

use crate::db::{RepositoryError, orders};
use crate::models::cart::PricedLine;
use crate::models::order::PlacedOrder;

/// Largest total that fits the `NUMERIC(12, 2)` order column, in minor units.
const MAX_TOTAL_MINOR_UNITS: i64 = 999_999_999_999;

/// Progress of a checkout, used for logging where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    Start,
    CartVerified,
    LinesLoaded,
    Priced,
    OrderPersisted,
    LinesPersisted,
    CartCleared,
    Committed,
}

impl CheckoutStage {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::CartVerified => "cart_verified",
            Self::LinesLoaded => "lines_loaded",
            Self::Priced => "priced",
            Self::OrderPersisted => "order_persisted",
            Self::LinesPersisted => "lines_persisted",
            Self::CartCleared => "cart_cleared",
            Self::Committed => "committed",
        }
    }
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    InvalidInput(&'static str),

    #[error("Cart not found")]
    CartNotFound,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("order total is out of range")]
    TotalOverflow,

    #[error("database error at {stage}: {source}")]
    Repository {
        stage: CheckoutStage,
        #[source]
        source: RepositoryError,
    },
}

impl CheckoutError {
    fn at(stage: CheckoutStage) -> impl FnOnce(RepositoryError) -> Self {
        move |source| Self::Repository { stage, source }
    }
}

/// Sum of `unit price x quantity` over the lines.
///
/// Each unit price is rounded half-up to cents before multiplying, and all
/// arithmetic is checked integer math on minor units.
///
/// # Errors
///
/// Returns `CheckoutError::TotalOverflow` if any step overflows or the total
/// does not fit the order column.
pub fn compute_total(lines: &[PricedLine]) -> Result<Price, CheckoutError> {
    let mut total: i64 = 0;

    for line in lines {
        let unit = line
            .price
            .to_minor_units()
            .map_err(|_| CheckoutError::TotalOverflow)?;
        let line_total = unit
            .checked_mul(i64::from(line.quantity))
            .ok_or(CheckoutError::TotalOverflow)?;
        total = total
            .checked_add(line_total)
            .ok_or(CheckoutError::TotalOverflow)?;
    }

    if total > MAX_TOTAL_MINOR_UNITS {
        return Err(CheckoutError::TotalOverflow);
    }

    Price::from_minor_units(total).map_err(|_| CheckoutError::TotalOverflow)
}

/// Places orders from carts.
pub struct CheckoutPipeline<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutPipeline<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Convert `cart_id` (owned by `user_id`) into an order and empty the cart.
    ///
    /// Either every step commits or none does.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidInput` for non-positive ids.
    /// Returns `CheckoutError::CartNotFound` if the cart is missing or not the user's.
    /// Returns `CheckoutError::EmptyCart` if the cart has no lines.
    /// Returns `CheckoutError::Repository` if a query fails.
    #[instrument(skip_all, fields(user_id = %user_id, cart_id = %cart_id))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        cart_id: CartId,
    ) -> Result<PlacedOrder, CheckoutError> {
        if !user_id.is_positive() {
            return Err(CheckoutError::InvalidInput("Invalid user id"));
        }
        if !cart_id.is_positive() {
            return Err(CheckoutError::InvalidInput(
                "cartId must be a positive integer",
            ));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CheckoutError::at(CheckoutStage::Start)(e.into()))?;
        let mut stage = CheckoutStage::Start;

        let outcome = run(&mut *tx, user_id, cart_id, &mut stage).await;
        match outcome {
            Ok(placed) => {
                tx.commit()
                    .await
                    .map_err(|e| CheckoutError::at(stage)(e.into()))?;
                tracing::debug!(stage = %CheckoutStage::Committed, "Checkout stage reached");
                tracing::info!(
                    order_id = %placed.order.id,
                    total = %placed.order.total,
                    lines = placed.items.len(),
                    "Order placed"
                );
                Ok(placed)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, stage = %stage, "Checkout rollback failed");
                }
                tracing::warn!(stage = %stage, error = %err, "Checkout rolled back");
                Err(err)
            }
        }
    }
}

fn advance(stage: &mut CheckoutStage, next: CheckoutStage) {
    *stage = next;
    tracing::debug!(stage = %next, "Checkout stage reached");
}

async fn run(
    conn: &mut PgConnection,
    user_id: UserId,
    cart_id: CartId,
    stage: &mut CheckoutStage,
) -> Result<PlacedOrder, CheckoutError> {
    let cart = orders::lock_cart(&mut *conn, cart_id, user_id)
        .await
        .map_err(CheckoutError::at(*stage))?
        .ok_or(CheckoutError::CartNotFound)?;
    advance(stage, CheckoutStage::CartVerified);

    let lines = orders::priced_lines(&mut *conn, cart.id)
        .await
        .map_err(CheckoutError::at(*stage))?;
    advance(stage, CheckoutStage::LinesLoaded);

    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let total = compute_total(&lines)?;
    advance(stage, CheckoutStage::Priced);

    let order = orders::insert_order(&mut *conn, user_id, cart.id, total)
        .await
        .map_err(CheckoutError::at(*stage))?;
    advance(stage, CheckoutStage::OrderPersisted);

    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        let quantity = Quantity::new(i64::from(line.quantity)).map_err(|e| {
            CheckoutError::at(*stage)(RepositoryError::DataCorruption(e.to_string()))
        })?;
        let item = orders::insert_order_line(&mut *conn, order.id, line.product_id, quantity)
            .await
            .map_err(CheckoutError::at(*stage))?;
        items.push(item);
    }
    advance(stage, CheckoutStage::LinesPersisted);

    orders::clear_cart(&mut *conn, cart.id)
        .await
        .map_err(CheckoutError::at(*stage))?;
    advance(stage, CheckoutStage::CartCleared);

    Ok(PlacedOrder { order, items })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use sushi_delivery_core::ProductId;

    use super::*;

    fn line(product: i32, price: &str, quantity: i32) -> PricedLine {
        PricedLine {
            product_id: ProductId::new(product),
            quantity,
            price: Price::new(price.parse::<Decimal>().unwrap()).unwrap(),
        }
    }

    #[test]
    fn test_compute_total() {
        let lines = [line(1, "490.00", 2), line(2, "260.00", 1)];
        let total = compute_total(&lines).unwrap();
        assert_eq!(total.to_string(), "1240.00");
    }

    #[test]
    fn test_compute_total_rounds_unit_price_half_up() {
        // 0.125 rounds to 0.13 before multiplying
        let total = compute_total(&[line(1, "0.125", 3)]).unwrap();
        assert_eq!(total.to_string(), "0.39");
    }

    #[test]
    fn test_compute_total_empty_is_zero() {
        assert_eq!(compute_total(&[]).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_compute_total_overflow() {
        let lines = [line(1, "92233720368547758.07", 1), line(2, "1.00", 1)];
        assert!(matches!(
            compute_total(&lines),
            Err(CheckoutError::TotalOverflow)
        ));

        let too_large = [line(1, "100000000.00", 100)];
        assert!(matches!(
            compute_total(&too_large),
            Err(CheckoutError::TotalOverflow)
        ));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(CheckoutStage::Start.to_string(), "start");
        assert_eq!(CheckoutStage::CartCleared.to_string(), "cart_cleared");
    }
}
