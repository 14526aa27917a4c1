//! Cart Models
//!
//! Cart lines live in their own `cart_item` table keyed by
//! (user, product, size) with a unique index, rather than as an embedded
//! array on the user document. Adding an existing pair increments quantity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::product::{SizeLabel, SizeStock};

/// One cart line: a (product, size, quantity, price-at-add-time) tuple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Owning user id, as issued by the auth collaborator.
    pub user: String,
    pub product: RecordId,
    pub size: SizeLabel,
    pub quantity: i64,
    /// Unit price captured when the line was added. Checkout never
    /// re-reads it from the product.
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub added_at: DateTime<Utc>,
}

/// A checkout-ready cart line: the stored line joined against current
/// product data. `unit_price` still comes from the cart line; the size
/// array carries *current* stock for the orchestrator's pre-flight check.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub product: RecordId,
    pub name: String,
    pub image: Option<String>,
    pub size: SizeLabel,
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    /// Current per-size stock of the referenced product.
    #[serde(skip)]
    pub sizes: Vec<SizeStock>,
}

impl CartLine {
    /// Current stock for this line's size, `None` if the product no
    /// longer carries the size.
    pub fn current_stock(&self) -> Option<i64> {
        self.sizes
            .iter()
            .find(|s| s.size == self.size)
            .map(|s| s.stock)
    }
}
