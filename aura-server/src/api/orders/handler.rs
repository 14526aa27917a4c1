//! Order API Handlers
//!
//! Checkout plus the order reads: own orders for everyone, the full list
//! and status transitions for admins only.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Order, OrderStatus, PaymentMethod, ShippingAddress};
use crate::db::repository::OrderRepository;
use crate::payment::GatewayOrder;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct ShippingAddressRequest {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(length(min = 1, max = 20))]
    pub mobile: String,
    #[validate(length(min = 1, max = 500))]
    pub address_line: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 1, max = 10))]
    pub pincode: String,
}

impl From<ShippingAddressRequest> for ShippingAddress {
    fn from(req: ShippingAddressRequest) -> Self {
        Self {
            full_name: req.full_name,
            mobile: req.mobile,
            address_line: req.address_line,
            city: req.city,
            state: req.state,
            pincode: req.pincode,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(nested)]
    pub shipping_address: ShippingAddressRequest,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order: Order,
    /// Present for ONLINE orders: what the client hands to the gateway widget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_order: Option<GatewayOrder>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// POST /api/orders - convert the caller's cart into an order
pub async fn checkout(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutResponse>> {
    req.validate()?;
    let placed = state
        .checkout
        .checkout(&user.id, req.shipping_address.into(), req.payment_method)
        .await?;
    Ok(Json(CheckoutResponse {
        order: placed.order,
        gateway_order: placed.gateway_order,
    }))
}

/// GET /api/orders/my - the caller's own orders, newest first
pub async fn my_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Order>>> {
    let repo = OrderRepository::new(state.db.clone());
    Ok(Json(repo.find_by_user(&user.id).await?))
}

/// GET /api/orders/{id} - one order, owner or admin only
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id}")))?;

    if !user.can_access(&order.user) {
        return Err(AppError::forbidden("Not your order"));
    }
    Ok(Json(order))
}

/// GET /api/orders - every order, admin only
pub async fn list_all(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Order>>> {
    if !user.is_admin() {
        return Err(AppError::forbidden("Admin access required"));
    }
    let repo = OrderRepository::new(state.db.clone());
    Ok(Json(repo.find_all().await?))
}

/// PUT /api/orders/{id}/status - admin status transition
///
/// Rejects anything outside the five enumerated statuses with no mutation.
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<Json<Order>> {
    if !user.is_admin() {
        return Err(AppError::forbidden("Admin access required"));
    }
    let status: OrderStatus = req
        .status
        .parse()
        .map_err(|e: crate::db::models::OrderStatusError| AppError::validation(e.to_string()))?;

    let repo = OrderRepository::new(state.db.clone());
    Ok(Json(repo.update_status(&id, status).await?))
}
