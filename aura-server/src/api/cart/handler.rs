//! Cart API Handlers
//!
//! All routes operate on the authenticated caller's own cart.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{CartLine, SizeLabel};
use crate::db::repository::CartRepository;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartRequest {
    #[validate(length(min = 1, max = 100))]
    pub product_id: String,
    pub size: SizeLabel,
    #[validate(range(min = 1, max = 100))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(length(min = 1, max = 100))]
    pub product_id: String,
    pub size: SizeLabel,
    #[validate(range(min = 1, max = 100))]
    pub quantity: i64,
}

/// GET /api/cart - the caller's cart joined against current product data
pub async fn get_cart(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<CartLine>>> {
    let repo = CartRepository::new(state.db.clone());
    Ok(Json(repo.snapshot(&user.id).await?))
}

/// POST /api/cart - add a line (or bump an existing pair's quantity)
pub async fn add_to_cart(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<AddToCartRequest>,
) -> AppResult<Json<Vec<CartLine>>> {
    req.validate()?;
    let repo = CartRepository::new(state.db.clone());
    repo.add(&user.id, &req.product_id, req.size, req.quantity)
        .await?;
    Ok(Json(repo.snapshot(&user.id).await?))
}

/// PUT /api/cart - set a line's quantity
pub async fn update_quantity(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<UpdateQuantityRequest>,
) -> AppResult<Json<Vec<CartLine>>> {
    req.validate()?;
    let repo = CartRepository::new(state.db.clone());
    repo.update_quantity(&user.id, &req.product_id, req.size, req.quantity)
        .await?;
    Ok(Json(repo.snapshot(&user.id).await?))
}

/// DELETE /api/cart/{product_id}/{size} - remove one line
pub async fn remove_from_cart(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path((product_id, size)): Path<(String, String)>,
) -> AppResult<Json<Vec<CartLine>>> {
    let size: SizeLabel = size.parse().map_err(AppError::validation)?;
    let repo = CartRepository::new(state.db.clone());
    repo.remove(&user.id, &product_id, size).await?;
    Ok(Json(repo.snapshot(&user.id).await?))
}
