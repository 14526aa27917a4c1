//! Category API Handlers

use axum::{Json, extract::State};

use crate::core::ServerState;
use crate::db::models::Category;
use crate::db::repository::CategoryRepository;
use crate::utils::AppResult;

/// GET /api/categories - list active categories
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Category>>> {
    let repo = CategoryRepository::new(state.db.clone());
    let categories = repo.find_all().await?;
    Ok(Json(categories))
}
