//! Product API Handlers
//!
//! Catalog reads plus buyer reviews. The catalog itself is managed by an
//! external collaborator; reviews are the one write this server accepts on
//! the product surface.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Product, Review};
use crate::db::repository::{ProductRepository, ReviewRepository};
use crate::utils::{AppError, AppResult};

/// GET /api/products - list active products
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Product>>> {
    let repo = ProductRepository::new(state.db.clone());
    let products = repo.find_all().await?;
    Ok(Json(products))
}

/// GET /api/products/{id} - fetch one product
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo
        .find_by_id(&id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::not_found(format!("Product {id}")))?;
    Ok(Json(product))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i64,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comment: String,
}

/// GET /api/products/{id}/reviews - a product's reviews, newest first
pub async fn list_reviews(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Review>>> {
    let repo = ReviewRepository::new(state.db.clone());
    Ok(Json(repo.find_by_product(&id).await?))
}

/// POST /api/products/{id}/reviews - add a buyer's review
///
/// Buyers only: the caller must have a delivered order containing the
/// product, and may review it at most once.
pub async fn add_review(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<AddReviewRequest>,
) -> AppResult<Json<Review>> {
    req.validate()?;
    let repo = ReviewRepository::new(state.db.clone());
    let review = repo
        .add(&user.id, &user.name, &id, req.rating, req.comment)
        .await?;
    Ok(Json(review))
}
