//! Payment Reconciliation
//!
//! Verifies a gateway's signed payment confirmation and finalizes the
//! associated pending order. Inventory for online orders is reserved exactly
//! once, here, after the signature gate — never at checkout time.

pub mod gateway;
pub mod signature;

pub use gateway::{GatewayError, GatewayOrder, HttpGateway, PaymentGateway};
pub use signature::SignatureVerifier;

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

use crate::db::models::{Order, PaymentMethod, PaymentStatus, SizeLabel};
use crate::db::repository::{
    InventoryError, InventoryLedger, OrderRepository, ProductRepository, RepoError,
    ReservationLine,
};
use crate::utils::AppError;

/// Payment reconciliation errors
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Missing gateway payment fields")]
    MissingFields,

    #[error("Invalid gateway signature")]
    InvalidSignature,

    #[error("No pending order for gateway order {0}")]
    UnknownOrder(String),

    #[error("Payment already processed for this order")]
    AlreadyProcessed,

    #[error("Insufficient stock for {product} ({size})")]
    InsufficientStock { product: String, size: SizeLabel },

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<InventoryError> for PaymentError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::Insufficient { product, size } => {
                PaymentError::InsufficientStock { product, size }
            }
            InventoryError::Database(msg) => PaymentError::Repo(RepoError::Database(msg)),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::MissingFields => {
                AppError::validation("Missing gateway payment fields")
            }
            // Never echo anything signature-related back
            PaymentError::InvalidSignature => AppError::forbidden("Invalid payment signature"),
            PaymentError::UnknownOrder(id) => {
                AppError::not_found(format!("No pending order for gateway order {id}"))
            }
            PaymentError::AlreadyProcessed => {
                AppError::conflict("Payment already processed for this order")
            }
            PaymentError::InsufficientStock { product, size } => {
                AppError::business_rule(format!("Insufficient stock for {product} ({size})"))
            }
            PaymentError::Repo(e) => e.into(),
        }
    }
}

/// A gateway payment confirmation as received from the client callback.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub gateway_signature: String,
}

impl PaymentConfirmation {
    /// Build from optional fields, rejecting absent or blank identifiers.
    pub fn from_fields(
        order_id: Option<String>,
        payment_id: Option<String>,
        signature: Option<String>,
    ) -> Result<Self, PaymentError> {
        let require = |v: Option<String>| -> Result<String, PaymentError> {
            match v {
                Some(s) if !s.trim().is_empty() => Ok(s),
                _ => Err(PaymentError::MissingFields),
            }
        };
        Ok(Self {
            gateway_order_id: require(order_id)?,
            gateway_payment_id: require(payment_id)?,
            gateway_signature: require(signature)?,
        })
    }
}

/// Finalizes pending online orders against verified gateway confirmations.
#[derive(Clone)]
pub struct ReconciliationService {
    orders: OrderRepository,
    products: ProductRepository,
    ledger: InventoryLedger,
    verifier: Arc<SignatureVerifier>,
}

impl ReconciliationService {
    pub fn new(db: Surreal<Db>, verifier: Arc<SignatureVerifier>) -> Self {
        Self {
            orders: OrderRepository::new(db.clone()),
            products: ProductRepository::new(db.clone()),
            ledger: InventoryLedger::new(db),
            verifier,
        }
    }

    /// Verify a payment confirmation and finalize the user's pending order.
    ///
    /// 1. Signature gate (sole trust boundary).
    /// 2. Locate the caller's pending ONLINE order by gateway order id.
    /// 3. Re-validate stock for the order's frozen items — time has passed
    ///    since checkout.
    /// 4. Reserve inventory (all-or-nothing), then claim `Pending → Paid`.
    ///    A duplicate callback loses the conditional claim and the
    ///    reservation is released, so stock moves at most once per order.
    pub async fn verify(
        &self,
        user: &str,
        confirmation: PaymentConfirmation,
    ) -> Result<Order, PaymentError> {
        if !self.verifier.verify(
            &confirmation.gateway_order_id,
            &confirmation.gateway_payment_id,
            &confirmation.gateway_signature,
        ) {
            tracing::warn!(
                user,
                gateway_order_id = %confirmation.gateway_order_id,
                "Rejected payment confirmation with invalid signature"
            );
            return Err(PaymentError::InvalidSignature);
        }

        let order = self
            .orders
            .find_by_gateway_order(user, &confirmation.gateway_order_id)
            .await?
            .ok_or_else(|| PaymentError::UnknownOrder(confirmation.gateway_order_id.clone()))?;

        if order.payment_method != PaymentMethod::Online
            || order.payment_status != PaymentStatus::Pending
        {
            return Err(PaymentError::AlreadyProcessed);
        }

        self.revalidate_stock(&order).await?;

        let lines: Vec<ReservationLine> = order.items.iter().map(Into::into).collect();
        if let Err(e) = self.ledger.reserve(&lines).await {
            if matches!(e, InventoryError::Insufficient { .. }) {
                tracing::error!(
                    user,
                    gateway_order_id = %confirmation.gateway_order_id,
                    error = %e,
                    "Stock ran out between checkout and payment confirmation; cancelling order"
                );
                self.orders.mark_cancelled(&order).await?;
            }
            return Err(e.into());
        }

        match self
            .orders
            .claim_paid(
                &order,
                &confirmation.gateway_payment_id,
                &confirmation.gateway_signature,
            )
            .await?
        {
            Some(finalized) => {
                tracing::info!(
                    user,
                    order_id = ?finalized.id,
                    gateway_order_id = %confirmation.gateway_order_id,
                    "Payment verified and order finalized"
                );
                Ok(finalized)
            }
            None => {
                // Another callback claimed the order first; undo our reservation
                self.ledger.release(&lines).await;
                Err(PaymentError::AlreadyProcessed)
            }
        }
    }

    /// Advisory re-check of current stock against the order's frozen items,
    /// mirroring the checkout pre-flight. The reservation remains the
    /// authoritative guard.
    async fn revalidate_stock(&self, order: &Order) -> Result<(), PaymentError> {
        for item in &order.items {
            let product = self.products.find(&item.product).await?;
            let available = product.and_then(|p| p.stock_for(item.size)).unwrap_or(0);
            if available < item.quantity {
                tracing::error!(
                    user = %order.user,
                    product = %item.name,
                    size = %item.size,
                    "Stock ran out between checkout and payment confirmation; cancelling order"
                );
                self.orders.mark_cancelled(order).await?;
                return Err(PaymentError::InsufficientStock {
                    product: item.name.clone(),
                    size: item.size,
                });
            }
        }
        Ok(())
    }
}
