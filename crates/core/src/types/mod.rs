//! Core types for Sushi Delivery.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod quantity;
pub mod role;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use quantity::{InvalidQuantity, Quantity};
pub use role::{RoleCode, UnknownRole};
pub use status::*;
