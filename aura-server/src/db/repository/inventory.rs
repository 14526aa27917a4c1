//! Inventory Ledger
//!
//! Owns the per-product, per-size stock counters. The only stock mutation
//! in the system is the conditional decrement below: a single UPDATE
//! statement that checks `stock >= quantity` and decrements in the same
//! atomic step against the store. Concurrent checkouts racing for the same
//! size serialize on the document; stock can never go negative.
//!
//! Reservations across several lines are made all-or-nothing by an explicit
//! compensating release: if line *k* fails, lines *1..k-1* are incremented
//! back before the error is returned.

use serde::Serialize;
use surrealdb::Surreal;
use surrealdb::RecordId;
use surrealdb::engine::local::Db;
use thiserror::Error;

use super::BaseRepository;
use crate::db::models::{OrderItem, Product, SizeLabel};

/// Inventory errors
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Insufficient stock for {product} ({size})")]
    Insufficient { product: String, size: SizeLabel },

    #[error("Database error: {0}")]
    Database(String),
}

impl From<surrealdb::Error> for InventoryError {
    fn from(err: surrealdb::Error) -> Self {
        InventoryError::Database(err.to_string())
    }
}

/// One line of a reservation request.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationLine {
    pub product: RecordId,
    /// Product name, carried only for error reporting.
    pub name: String,
    pub size: SizeLabel,
    pub quantity: i64,
}

impl From<&OrderItem> for ReservationLine {
    fn from(item: &OrderItem) -> Self {
        Self {
            product: item.product.clone(),
            name: item.name.clone(),
            size: item.size,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InventoryLedger {
    base: BaseRepository,
}

impl InventoryLedger {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Reserve stock for every line, in order. All-or-nothing: on the first
    /// line that lacks stock, already-decremented lines are released and
    /// the call fails with [`InventoryError::Insufficient`].
    ///
    /// Not idempotent — callers invoke exactly once per order.
    pub async fn reserve(&self, lines: &[ReservationLine]) -> Result<(), InventoryError> {
        for (idx, line) in lines.iter().enumerate() {
            let reserved = self.try_decrement(line).await?;
            if !reserved {
                self.release(&lines[..idx]).await;
                return Err(InventoryError::Insufficient {
                    product: line.name.clone(),
                    size: line.size,
                });
            }
        }
        Ok(())
    }

    /// Check-and-decrement in one atomic statement. Returns `false` when the
    /// size is missing or its stock is below the requested quantity.
    async fn try_decrement(&self, line: &ReservationLine) -> Result<bool, InventoryError> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $product SET sizes = array::map(sizes, |$s| \
                     IF $s.size = $size THEN \
                         { size: $s.size, stock: $s.stock - $qty } \
                     ELSE $s END) \
                 WHERE array::len(sizes[WHERE size = $size AND stock >= $qty]) > 0 \
                 RETURN AFTER",
            )
            .bind(("product", line.product.clone()))
            .bind(("size", line.size))
            .bind(("qty", line.quantity))
            .await?;

        let updated: Option<Product> = result.take(0)?;
        Ok(updated.is_some())
    }

    /// Compensating increment for previously reserved lines. Also used when
    /// a reserved order cannot be finalized. Best effort: a failure here is
    /// logged and skipped so the remaining lines are still released.
    pub async fn release(&self, lines: &[ReservationLine]) {
        for line in lines {
            let result = self
                .base
                .db()
                .query(
                    "UPDATE $product SET sizes = array::map(sizes, |$s| \
                         IF $s.size = $size THEN \
                             { size: $s.size, stock: $s.stock + $qty } \
                         ELSE $s END)",
                )
                .bind(("product", line.product.clone()))
                .bind(("size", line.size))
                .bind(("qty", line.quantity))
                .await;

            if let Err(e) = result {
                tracing::error!(
                    product = %line.product,
                    size = %line.size,
                    quantity = line.quantity,
                    error = %e,
                    "Failed to release reserved stock"
                );
            }
        }
    }
}
