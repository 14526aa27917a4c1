//! Order Model
//!
//! The order aggregate is immutable once created except for two controlled
//! fields: `payment_status` (checkout, reconciliation, or delivery) and
//! `order_status` (the forward-moving state machine below).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use thiserror::Error;

use super::product::SizeLabel;

/// How the order is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Cod,
    Online,
}

/// Whether the order has been paid.
///
/// COD orders are treated as paid on placement (explicit source behavior);
/// ONLINE orders stay `Pending` until the gateway signature verifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// Order lifecycle: `Placed → Packed → Shipped → Delivered`, with
/// `Cancelled` reachable from any non-terminal state. `Delivered` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Placed,
    Packed,
    Shipped,
    Delivered,
    Cancelled,
}

/// Error raised by status parsing/transition checks. Performs no mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderStatusError {
    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    #[error("Order status cannot change from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Placed" => Ok(OrderStatus::Placed),
            "Packed" => Ok(OrderStatus::Packed),
            "Shipped" => Ok(OrderStatus::Shipped),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(OrderStatusError::InvalidStatus(other.to_string())),
        }
    }
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "Placed",
            OrderStatus::Packed => "Packed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    fn rank(&self) -> u8 {
        match self {
            OrderStatus::Placed => 0,
            OrderStatus::Packed => 1,
            OrderStatus::Shipped => 2,
            OrderStatus::Delivered => 3,
            // Cancelled sits outside the forward sequence
            OrderStatus::Cancelled => u8::MAX,
        }
    }

    /// Check a transition against the state machine. Forward-only along
    /// the fulfilment sequence; `Cancelled` from any non-terminal state.
    pub fn check_transition(&self, to: OrderStatus) -> Result<(), OrderStatusError> {
        let invalid = || OrderStatusError::InvalidTransition { from: *self, to };

        if self.is_terminal() {
            return Err(invalid());
        }
        if to == OrderStatus::Cancelled {
            return Ok(());
        }
        if to.rank() > self.rank() {
            Ok(())
        } else {
            Err(invalid())
        }
    }
}

/// Frozen copy of one purchased line. Independent of later product edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: RecordId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub size: SizeLabel,
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

/// Shipping address snapshot stored on the order. All fields required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub mobile: String,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

/// The order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Owning user id, read-only after creation.
    pub user: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    /// Sum of `unit_price * quantity` over `items`, computed once at
    /// creation and never recomputed.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    // Gateway correlation fields, ONLINE orders only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_signature: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Sum of `unit_price * quantity` over a set of frozen items.
    pub fn total_of(items: &[OrderItem]) -> Decimal {
        items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum()
    }

    /// Build a new `Placed` order from frozen items.
    pub fn new(
        user: String,
        items: Vec<OrderItem>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        payment_status: PaymentStatus,
    ) -> Self {
        let total_amount = Self::total_of(&items);
        Self {
            id: None,
            user,
            items,
            shipping_address,
            payment_method,
            payment_status,
            order_status: OrderStatus::Placed,
            total_amount,
            gateway_order_id: None,
            gateway_payment_id: None,
            gateway_signature: None,
            created_at: Utc::now(),
            delivered_at: None,
        }
    }
}
