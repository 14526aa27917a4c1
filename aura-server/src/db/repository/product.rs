//! Product Repository
//!
//! Read-only catalog access. Stock mutation lives in the inventory ledger.

use super::{BaseRepository, RepoResult, parse_record_id};
use crate::db::models::Product;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

pub const PRODUCT_TABLE: &str = "product";

#[derive(Debug, Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all active products
    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE is_active = true ORDER BY name")
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find product by id (`product:key` or bare key)
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let record_id = parse_record_id(PRODUCT_TABLE, id);
        self.find(&record_id).await
    }

    /// Find product by record id
    pub async fn find(&self, id: &RecordId) -> RepoResult<Option<Product>> {
        let product: Option<Product> = self.base.db().select(id.clone()).await?;
        Ok(product)
    }
}
