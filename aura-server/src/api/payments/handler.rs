//! Payment API Handlers

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Order;
use crate::payment::PaymentConfirmation;
use crate::utils::AppResult;

/// Gateway callback payload as relayed by the client. Fields are optional
/// on the wire; absence is rejected as a structured validation error.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
}

/// POST /api/payments/verify - verify a signed confirmation and finalize
/// the caller's pending order
pub async fn verify(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<VerifyPaymentRequest>,
) -> AppResult<Json<Order>> {
    let confirmation = PaymentConfirmation::from_fields(
        req.gateway_order_id,
        req.gateway_payment_id,
        req.gateway_signature,
    )?;
    let order = state.reconciliation.verify(&user.id, confirmation).await?;
    Ok(Json(order))
}
