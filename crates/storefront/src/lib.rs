//! Sushi Delivery Storefront library.
//!
//! JSON API for customers: registration and login with bearer tokens, a
//! per-user cart, and checkout that turns the cart into an order. Exposed
//! as a library so the binary, the CLI and the integration tests share one
//! implementation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
