//! Domain models for storefront.
//!
//! Response types serialize with camelCase field names.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod user;

pub use cart::{Cart, CartLine, CartView, PricedLine};
pub use catalog::{Category, Product};
pub use order::{Order, OrderLine, PlacedOrder};
pub use user::{AuthSession, CurrentUser, LoginRequest, Registration, User};
