//! Checkout Orchestrator
//!
//! The single entry point that turns a cart into a committed order:
//! snapshot the cart, pre-flight the stock, freeze items and total, create
//! the order, then branch on payment method. COD reserves inventory
//! immediately; ONLINE registers a gateway order and defers reservation to
//! payment reconciliation. Order creation and cart clearing run in one
//! database transaction.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::{
    CartLine, Order, OrderItem, PaymentMethod, PaymentStatus, ShippingAddress, SizeLabel,
};
use crate::db::repository::{
    CartRepository, InventoryError, InventoryLedger, OrderRepository, RepoError,
    ReservationLine,
};
use crate::payment::{GatewayError, GatewayOrder, PaymentGateway};
use crate::utils::AppError;

/// Checkout failures
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient stock for {product} ({size})")]
    InsufficientStock { product: String, size: SizeLabel },

    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<InventoryError> for CheckoutError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::Insufficient { product, size } => {
                CheckoutError::InsufficientStock { product, size }
            }
            InventoryError::Database(msg) => CheckoutError::Repo(RepoError::Database(msg)),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => AppError::validation("Cart is empty"),
            CheckoutError::InsufficientStock { product, size } => {
                AppError::business_rule(format!("Insufficient stock for {product} ({size})"))
            }
            CheckoutError::Gateway(e) => {
                tracing::error!(error = %e, "Payment gateway call failed");
                AppError::internal("Payment gateway unavailable")
            }
            CheckoutError::Repo(e) => e.into(),
        }
    }
}

/// A placed order, plus the gateway handle the client needs to complete an
/// online payment.
#[derive(Debug)]
pub struct PlacedOrder {
    pub order: Order,
    /// `Some` for ONLINE orders only.
    pub gateway_order: Option<GatewayOrder>,
}

/// Orchestrates cart → order conversion.
#[derive(Clone)]
pub struct CheckoutService {
    cart: CartRepository,
    orders: OrderRepository,
    ledger: InventoryLedger,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl CheckoutService {
    pub fn new(db: Surreal<Db>, gateway: Arc<dyn PaymentGateway>, currency: String) -> Self {
        Self {
            cart: CartRepository::new(db.clone()),
            orders: OrderRepository::new(db.clone()),
            ledger: InventoryLedger::new(db),
            gateway,
            currency,
        }
    }

    /// Convert the user's cart into a committed order.
    pub async fn checkout(
        &self,
        user: &str,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<PlacedOrder, CheckoutError> {
        let snapshot = self.cart.snapshot(user).await?;
        if snapshot.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // Advisory pre-flight against current stock; the atomic reservation
        // below is the authoritative guard. Fails before anything is created.
        preflight_stock(&snapshot)?;

        let items = freeze_items(&snapshot);
        let total = Order::total_of(&items);

        match payment_method {
            PaymentMethod::Cod => {
                // COD is treated as paid on placement; reservation follows
                // immediately after the order is durably created.
                let order = Order::new(
                    user.to_string(),
                    items,
                    shipping_address,
                    PaymentMethod::Cod,
                    PaymentStatus::Paid,
                );
                let created = self.orders.create_and_clear_cart(order).await?;

                let lines: Vec<ReservationLine> =
                    created.items.iter().map(Into::into).collect();
                if let Err(e) = self.ledger.reserve(&lines).await {
                    // The one known unsafe failure mode: the order exists but
                    // could not be backed by stock. Cancel it and alert.
                    tracing::error!(
                        user,
                        order_id = ?created.id,
                        error = %e,
                        "Reservation failed after order creation; cancelling order"
                    );
                    self.orders.mark_cancelled(&created).await?;
                    return Err(e.into());
                }

                tracing::info!(user, order_id = ?created.id, total = %created.total_amount,
                    "COD order placed");
                Ok(PlacedOrder { order: created, gateway_order: None })
            }
            PaymentMethod::Online => {
                // Register the order with the gateway first; no local state
                // has changed yet if this fails. Reservation is deferred to
                // payment reconciliation.
                let receipt = format!("aura_{}", Uuid::new_v4().simple());
                let gateway_order = self
                    .gateway
                    .create_order(minor_units(total), &self.currency, &receipt)
                    .await?;

                let mut order = Order::new(
                    user.to_string(),
                    items,
                    shipping_address,
                    PaymentMethod::Online,
                    PaymentStatus::Pending,
                );
                order.gateway_order_id = Some(gateway_order.id.clone());
                let created = self.orders.create_and_clear_cart(order).await?;

                tracing::info!(user, order_id = ?created.id, gateway_order_id = %gateway_order.id,
                    "Online order placed, awaiting payment confirmation");
                Ok(PlacedOrder { order: created, gateway_order: Some(gateway_order) })
            }
        }
    }
}

/// Verify every line's requested quantity against current stock.
fn preflight_stock(snapshot: &[CartLine]) -> Result<(), CheckoutError> {
    for line in snapshot {
        let available = line.current_stock().unwrap_or(0);
        if available < line.quantity {
            return Err(CheckoutError::InsufficientStock {
                product: line.name.clone(),
                size: line.size,
            });
        }
    }
    Ok(())
}

/// Freeze the snapshot into order items, independent of later product edits.
fn freeze_items(snapshot: &[CartLine]) -> Vec<OrderItem> {
    snapshot
        .iter()
        .map(|line| OrderItem {
            product: line.product.clone(),
            name: line.name.clone(),
            image: line.image.clone(),
            size: line.size,
            quantity: line.quantity,
            unit_price: line.unit_price,
        })
        .collect()
}

/// Convert a major-unit amount to minor currency units for the gateway.
fn minor_units(amount: Decimal) -> i64 {
    (amount * Decimal::from(100)).round().to_i64().unwrap_or(i64::MAX)
}
