//! Category Repository

use super::{BaseRepository, RepoResult};
use crate::db::models::Category;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    base: BaseRepository,
}

impl CategoryRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all active categories
    pub async fn find_all(&self) -> RepoResult<Vec<Category>> {
        let categories: Vec<Category> = self
            .base
            .db()
            .query("SELECT * FROM category WHERE is_active = true ORDER BY name")
            .await?
            .take(0)?;
        Ok(categories)
    }
}
