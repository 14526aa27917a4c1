//! Repository Module
//!
//! CRUD and domain operations over the SurrealDB tables. Repositories are
//! thin, cloneable handles around the shared database connection.

// Catalog (read-only here)
pub mod category;
pub mod product;

// Cart
pub mod cart;

// Orders & inventory
pub mod inventory;
pub mod order;

// Reviews
pub mod review;

// Re-exports
pub use cart::CartRepository;
pub use category::CategoryRepository;
pub use inventory::{InventoryError, InventoryLedger, ReservationLine};
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use review::{ReviewError, ReviewRepository};

use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for crate::utils::AppError {
    fn from(err: RepoError) -> Self {
        use crate::utils::AppError;
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Base repository with database reference
#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

/// Parse a `table:key` id, falling back to treating the whole string as a
/// bare key in `table`. All IDs travel as `table:key` strings end to end.
pub fn parse_record_id(table: &str, id: &str) -> RecordId {
    id.parse::<RecordId>()
        .ok()
        .filter(|rid| rid.table() == table)
        .unwrap_or_else(|| RecordId::from_table_key(table, id))
}
