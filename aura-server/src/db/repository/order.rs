//! Order Repository
//!
//! Creation runs together with the cart clear in one database transaction:
//! a cart is never cleared without a durably persisted order, and never
//! before it. Everything else on the aggregate is read-only except the two
//! controlled fields (`order_status`, `payment_status`).

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Order, OrderStatus, PaymentStatus};

const ORDER_TABLE: &str = "orders";

#[derive(Debug, Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Persist the order and clear the owner's cart atomically.
    pub async fn create_and_clear_cart(&self, order: Order) -> RepoResult<Order> {
        let user = order.user.clone();
        let created: Option<Order> = self
            .base
            .db()
            .query(
                "BEGIN TRANSACTION; \
                 CREATE orders CONTENT $order; \
                 DELETE cart_item WHERE user = $user; \
                 COMMIT TRANSACTION;",
            )
            .bind(("order", order))
            .bind(("user", user))
            .await?
            .take(0)?;

        created.ok_or_else(|| RepoError::Database("order not created".into()))
    }

    /// Fetch one order by id (`orders:key` or bare key).
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let record_id = parse_record_id(ORDER_TABLE, id);
        let order: Option<Order> = self.base.db().select(record_id).await?;
        Ok(order)
    }

    /// List a user's own orders, newest first.
    pub async fn find_by_user(&self, user: &str) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM orders WHERE user = $user ORDER BY created_at DESC")
            .bind(("user", user.to_string()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// List every order, newest first. Admin surface.
    pub async fn find_all(&self) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM orders ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Find a user's pending ONLINE order by its gateway order id.
    pub async fn find_by_gateway_order(
        &self,
        user: &str,
        gateway_order_id: &str,
    ) -> RepoResult<Option<Order>> {
        let order: Option<Order> = self
            .base
            .db()
            .query(
                "SELECT * FROM orders \
                 WHERE user = $user AND gateway_order_id = $gateway_order_id \
                 LIMIT 1",
            )
            .bind(("user", user.to_string()))
            .bind(("gateway_order_id", gateway_order_id.to_string()))
            .await?
            .take(0)?;
        Ok(order)
    }

    /// Claim a pending order as paid, recording the gateway correlation
    /// fields. Conditional on the order still being `Pending`, so a
    /// duplicate gateway callback loses the race and gets `None` back.
    pub async fn claim_paid(
        &self,
        order: &Order,
        gateway_payment_id: &str,
        gateway_signature: &str,
    ) -> RepoResult<Option<Order>> {
        let id = order
            .id
            .clone()
            .ok_or_else(|| RepoError::Validation("order has no id".into()))?;

        let claimed: Option<Order> = self
            .base
            .db()
            .query(
                "UPDATE $id SET \
                     payment_status = $paid, \
                     gateway_payment_id = $payment_id, \
                     gateway_signature = $signature \
                 WHERE payment_status = $pending \
                 RETURN AFTER",
            )
            .bind(("id", id))
            .bind(("paid", PaymentStatus::Paid))
            .bind(("pending", PaymentStatus::Pending))
            .bind(("payment_id", gateway_payment_id.to_string()))
            .bind(("signature", gateway_signature.to_string()))
            .await?
            .take(0)?;

        Ok(claimed)
    }

    /// Apply a status transition. The state machine is validated against the
    /// current value before anything is written; `Delivered` is the only
    /// transition with a side effect (forces `payment_status = Paid` and
    /// stamps the delivery time).
    pub async fn update_status(
        &self,
        id: &str,
        new_status: OrderStatus,
    ) -> RepoResult<Order> {
        let order = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {id}")))?;

        order
            .order_status
            .check_transition(new_status)
            .map_err(|e| RepoError::Validation(e.to_string()))?;

        let record_id = parse_record_id(ORDER_TABLE, id);
        let query = if new_status == OrderStatus::Delivered {
            "UPDATE $id SET order_status = $status, \
                 payment_status = $paid, delivered_at = $delivered_at \
             WHERE order_status = $current RETURN AFTER"
        } else {
            "UPDATE $id SET order_status = $status \
             WHERE order_status = $current RETURN AFTER"
        };

        let updated: Option<Order> = self
            .base
            .db()
            .query(query)
            .bind(("id", record_id))
            .bind(("status", new_status))
            .bind(("paid", PaymentStatus::Paid))
            .bind(("delivered_at", chrono::Utc::now()))
            .bind(("current", order.order_status))
            .await?
            .take(0)?;

        // The conditional write lost a race with another transition
        updated.ok_or_else(|| RepoError::Validation("order status changed concurrently".into()))
    }

    /// Mark an order cancelled after a failed reservation or reconciliation.
    pub async fn mark_cancelled(&self, order: &Order) -> RepoResult<()> {
        let id = order
            .id
            .clone()
            .ok_or_else(|| RepoError::Validation("order has no id".into()))?;
        self.base
            .db()
            .query("UPDATE $id SET order_status = $status")
            .bind(("id", id))
            .bind(("status", OrderStatus::Cancelled))
            .await?;
        Ok(())
    }
}
