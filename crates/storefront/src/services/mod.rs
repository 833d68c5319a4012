//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login, password hashing and bearer tokens
//! - `cart` - The caller's cart and its lines
//! - `checkout` - Cart to order conversion in one transaction

pub mod auth;
pub mod cart;
pub mod checkout;

pub use auth::{AuthError, AuthService, TokenService};
pub use cart::{CartError, CartService};
pub use checkout::{CheckoutError, CheckoutPipeline, CheckoutStage};
