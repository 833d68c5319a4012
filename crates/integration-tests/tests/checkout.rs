//! Integration tests for order placement.
//!
//! These tests need a `PostgreSQL` database at `DATABASE_URL`.

#![allow(clippy::unwrap_used)]

use sushi_delivery_core::{
    CartId, OrderStatus, PaymentMethod, PaymentStatus, Price, Quantity, RoleCode,
};
use sushi_delivery_integration_tests::TestContext;
use sushi_delivery_storefront::services::{CartService, CheckoutError, CheckoutPipeline};

// =============================================================================
// Happy path
// =============================================================================

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_place_order_totals_lines_and_empties_cart() {
    let ctx = TestContext::new().await;
    let user = ctx.user(&[RoleCode::Client]).await;
    let category = ctx.category().await;
    let roll = ctx.product(category, 49_000).await;
    let nigiri = ctx.product(category, 26_000).await;

    let carts = CartService::new(&ctx.pool);
    carts
        .add_item(user.id, roll, Quantity::new(2).unwrap())
        .await
        .unwrap();
    let view = carts.add_item(user.id, nigiri, Quantity::ONE).await.unwrap();

    let placed = CheckoutPipeline::new(&ctx.pool)
        .place_order(user.id, view.cart.id)
        .await
        .unwrap();

    assert_eq!(placed.order.total, Price::from_minor_units(124_000).unwrap());
    assert_eq!(placed.order.total.to_string(), "1240.00");
    assert_eq!(placed.order.user_id, Some(user.id));
    assert_eq!(placed.order.cart_id, Some(view.cart.id));
    assert_eq!(placed.order.status, OrderStatus::New);
    assert_eq!(placed.order.payment_method, PaymentMethod::Cash);
    assert_eq!(placed.order.payment_status, PaymentStatus::Pending);

    assert_eq!(placed.items.len(), 2);
    assert_eq!(placed.items[0].product_id, Some(roll));
    assert_eq!(placed.items[0].quantity, 2);
    assert_eq!(placed.items[1].product_id, Some(nigiri));
    assert_eq!(placed.items[1].quantity, 1);

    let after = carts.my_cart(user.id).await.unwrap();
    assert_eq!(after.cart.id, view.cart.id);
    assert!(after.items.is_empty());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_total_uses_current_catalog_price() {
    let ctx = TestContext::new().await;
    let user = ctx.user(&[RoleCode::Client]).await;
    let category = ctx.category().await;
    let product = ctx.product(category, 10_000).await;

    let view = CartService::new(&ctx.pool)
        .add_item(user.id, product, Quantity::new(3).unwrap())
        .await
        .unwrap();
    ctx.set_price(product, 12_550).await;

    let placed = CheckoutPipeline::new(&ctx.pool)
        .place_order(user.id, view.cart.id)
        .await
        .unwrap();

    assert_eq!(placed.order.total.to_string(), "376.50");
}

// =============================================================================
// Failures leave no trace
// =============================================================================

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_empty_cart_places_nothing() {
    let ctx = TestContext::new().await;
    let user = ctx.user(&[RoleCode::Client]).await;
    let view = CartService::new(&ctx.pool).my_cart(user.id).await.unwrap();

    let err = CheckoutPipeline::new(&ctx.pool)
        .place_order(user.id, view.cart.id)
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(ctx.order_count(&user).await, 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_foreign_cart_is_not_found() {
    let ctx = TestContext::new().await;
    let owner = ctx.user(&[RoleCode::Client]).await;
    let intruder = ctx.user(&[RoleCode::Client]).await;
    let category = ctx.category().await;
    let product = ctx.product(category, 15_000).await;

    let carts = CartService::new(&ctx.pool);
    let view = carts.add_item(owner.id, product, Quantity::ONE).await.unwrap();

    let err = CheckoutPipeline::new(&ctx.pool)
        .place_order(intruder.id, view.cart.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::CartNotFound));

    // Owner's cart is untouched
    let after = carts.my_cart(owner.id).await.unwrap();
    assert_eq!(after.items.len(), 1);
    assert_eq!(ctx.order_count(&intruder).await, 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_unknown_cart_is_not_found() {
    let ctx = TestContext::new().await;
    let user = ctx.user(&[RoleCode::Client]).await;

    let err = CheckoutPipeline::new(&ctx.pool)
        .place_order(user.id, CartId::new(i32::MAX))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::CartNotFound));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_checkouts_place_exactly_one_order() {
    let ctx = TestContext::new().await;
    let user = ctx.user(&[RoleCode::Client]).await;
    let category = ctx.category().await;
    let product = ctx.product(category, 29_900).await;

    let view = CartService::new(&ctx.pool)
        .add_item(user.id, product, Quantity::new(2).unwrap())
        .await
        .unwrap();

    let pipeline = CheckoutPipeline::new(&ctx.pool);
    let (first, second) = tokio::join!(
        pipeline.place_order(user.id, view.cart.id),
        pipeline.place_order(user.id, view.cart.id),
    );

    let outcomes = [first, second];
    let placed = outcomes.iter().filter(|r| r.is_ok()).count();
    let empty = outcomes
        .iter()
        .filter(|r| matches!(r, Err(CheckoutError::EmptyCart)))
        .count();

    assert_eq!(placed, 1);
    assert_eq!(empty, 1);
    assert_eq!(ctx.order_count(&user).await, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_cart_change_during_checkout_serializes() {
    let ctx = TestContext::new().await;
    let user = ctx.user(&[RoleCode::Client]).await;
    let category = ctx.category().await;
    let product = ctx.product(category, 49_000).await;
    let carts = CartService::new(&ctx.pool);
    let pipeline = CheckoutPipeline::new(&ctx.pool);

    for _ in 0..10 {
        let view = carts.add_item(user.id, product, Quantity::ONE).await.unwrap();

        let (added, placed) = tokio::join!(
            carts.add_item(user.id, product, Quantity::ONE),
            pipeline.place_order(user.id, view.cart.id),
        );

        assert!(added.is_ok(), "add failed: {added:?}");
        assert!(
            !matches!(placed, Err(CheckoutError::Repository { .. })),
            "checkout failed: {placed:?}"
        );

        // Whatever ran second is left in the cart; clear it for the next round
        let after = carts.my_cart(user.id).await.unwrap();
        if !after.items.is_empty() {
            carts.remove_item(user.id, product).await.unwrap();
        }
    }
}
