//! Database Module
//!
//! Embedded SurrealDB storage. The server runs against a local RocksDB
//! engine; tests run against the in-memory engine with the same schema.

pub mod models;
pub mod repository;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

use crate::utils::AppError;

const NAMESPACE: &str = "aura";
const DATABASE: &str = "storefront";

/// Open the embedded database under `work_dir` and apply the schema.
pub async fn connect(work_dir: &str) -> Result<Surreal<Db>, AppError> {
    let path = format!("{work_dir}/database");
    let db = Surreal::new::<RocksDb>(path.as_str())
        .await
        .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

    db.use_ns(NAMESPACE)
        .use_db(DATABASE)
        .await
        .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

    define_schema(&db).await?;
    tracing::info!("Database ready at {path}");

    Ok(db)
}

/// Define tables and indexes, idempotently.
///
/// The unique cart index enforces at most one line per (user, product, size);
/// adds upsert into the existing line instead of duplicating it. The unique
/// review index enforces one review per (user, product).
pub async fn define_schema(db: &Surreal<Db>) -> Result<(), AppError> {
    db.query(
        r#"
        DEFINE TABLE IF NOT EXISTS product SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS category SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS cart_item SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS cart_item_owner_line
            ON TABLE cart_item FIELDS user, product, size UNIQUE;
        DEFINE TABLE IF NOT EXISTS orders SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS orders_user ON TABLE orders FIELDS user;
        DEFINE INDEX IF NOT EXISTS orders_gateway_order
            ON TABLE orders FIELDS gateway_order_id;
        DEFINE TABLE IF NOT EXISTS review SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS review_owner
            ON TABLE review FIELDS user, product UNIQUE;
        "#,
    )
    .await
    .map_err(|e| AppError::database(format!("Failed to define schema: {e}")))?;

    Ok(())
}
