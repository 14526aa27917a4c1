//! Database document models.
//!
//! - [`Product`] / [`Category`] - catalog documents (owned by the external
//!   catalog collaborator; this server only decrements per-size stock)
//! - [`CartItem`] - owned child collection of a user's in-progress order
//! - [`Order`] - the immutable record of a committed purchase
//! - [`Review`] - one buyer's review of a product

pub mod cart;
pub mod category;
pub mod order;
pub mod product;
pub mod review;

pub use cart::{CartItem, CartLine};
pub use category::Category;
pub use order::{
    Order, OrderItem, OrderStatus, OrderStatusError, PaymentMethod, PaymentStatus,
    ShippingAddress,
};
pub use product::{Product, SizeLabel, SizeStock};
pub use review::Review;
