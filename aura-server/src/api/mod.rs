//! API routing module
//!
//! # Structure
//!
//! - [`health`] - health check
//! - [`products`] - read-only product views
//! - [`categories`] - read-only category views
//! - [`cart`] - the caller's cart lines
//! - [`orders`] - checkout and order reads / status transitions
//! - [`payments`] - gateway payment verification

pub mod cart;
pub mod categories;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;
