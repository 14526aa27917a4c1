//! Cart Repository
//!
//! Cart lines are an owned child collection keyed by (user, product, size).
//! Adding an existing pair increments quantity; the unique index defined in
//! [`crate::db::define_schema`] guards against duplicate lines racing in.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::product::PRODUCT_TABLE;
use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{CartItem, CartLine, Product, SizeLabel};

const CART_TABLE: &str = "cart_item";

/// A cart line with its product fetched in one query.
#[derive(Debug, Deserialize)]
struct FetchedLine {
    product: Product,
    size: SizeLabel,
    quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    unit_price: Decimal,
}

impl FetchedLine {
    fn into_cart_line(self) -> RepoResult<CartLine> {
        let product_id = self
            .product
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("fetched product has no id".into()))?;
        Ok(CartLine {
            product: product_id,
            name: self.product.name.clone(),
            image: self.product.first_image(),
            size: self.size,
            quantity: self.quantity,
            unit_price: self.unit_price,
            sizes: self.product.sizes,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CartRepository {
    base: BaseRepository,
}

impl CartRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Add a (product, size, quantity) line to the user's cart.
    ///
    /// The unit price is captured from the product's current final price;
    /// later catalog edits do not touch existing lines. Adding an existing
    /// (product, size) pair increments its quantity instead of duplicating.
    pub async fn add(
        &self,
        user: &str,
        product_id: &str,
        size: SizeLabel,
        quantity: i64,
    ) -> RepoResult<CartItem> {
        if quantity < 1 {
            return Err(RepoError::Validation("quantity must be at least 1".into()));
        }

        let record_id = parse_record_id(PRODUCT_TABLE, product_id);
        let product: Option<Product> = self.base.db().select(record_id.clone()).await?;
        let product = product
            .filter(|p| p.is_active)
            .ok_or_else(|| RepoError::NotFound(format!("Product {product_id}")))?;

        if product.stock_for(size).is_none() {
            return Err(RepoError::Validation(format!(
                "Product {} does not carry size {size}",
                product.name
            )));
        }

        // Upsert: bump the existing line if the pair is already in the cart
        let updated: Option<CartItem> = self
            .base
            .db()
            .query(
                "UPDATE cart_item SET quantity += $qty \
                 WHERE user = $user AND product = $product AND size = $size \
                 RETURN AFTER",
            )
            .bind(("user", user.to_string()))
            .bind(("product", record_id.clone()))
            .bind(("size", size))
            .bind(("qty", quantity))
            .await?
            .take(0)?;

        if let Some(item) = updated {
            return Ok(item);
        }

        let item = CartItem {
            id: None,
            user: user.to_string(),
            product: record_id,
            size,
            quantity,
            unit_price: product.final_price(),
            added_at: Utc::now(),
        };
        let created: Option<CartItem> = self
            .base
            .db()
            .create(CART_TABLE)
            .content(item)
            .await
            .map_err(|e| {
                // Unique index violation: another request created the line first
                let msg = e.to_string();
                if msg.contains("cart_item_owner_line") {
                    RepoError::Duplicate("cart line already exists".into())
                } else {
                    RepoError::Database(msg)
                }
            })?;
        created.ok_or_else(|| RepoError::Database("cart line not created".into()))
    }

    /// Set the quantity of an existing line.
    pub async fn update_quantity(
        &self,
        user: &str,
        product_id: &str,
        size: SizeLabel,
        quantity: i64,
    ) -> RepoResult<CartItem> {
        if quantity < 1 {
            return Err(RepoError::Validation("quantity must be at least 1".into()));
        }

        let record_id = parse_record_id(PRODUCT_TABLE, product_id);
        let updated: Option<CartItem> = self
            .base
            .db()
            .query(
                "UPDATE cart_item SET quantity = $qty \
                 WHERE user = $user AND product = $product AND size = $size \
                 RETURN AFTER",
            )
            .bind(("user", user.to_string()))
            .bind(("product", record_id))
            .bind(("size", size))
            .bind(("qty", quantity))
            .await?
            .take(0)?;

        updated.ok_or_else(|| RepoError::NotFound("Item not found in cart".into()))
    }

    /// Remove one line from the cart.
    pub async fn remove(&self, user: &str, product_id: &str, size: SizeLabel) -> RepoResult<()> {
        let record_id = parse_record_id(PRODUCT_TABLE, product_id);
        self.base
            .db()
            .query("DELETE cart_item WHERE user = $user AND product = $product AND size = $size")
            .bind(("user", user.to_string()))
            .bind(("product", record_id))
            .bind(("size", size))
            .await?;
        Ok(())
    }

    /// Remove every line owned by the user.
    pub async fn clear(&self, user: &str) -> RepoResult<()> {
        self.base
            .db()
            .query("DELETE cart_item WHERE user = $user")
            .bind(("user", user.to_string()))
            .await?;
        Ok(())
    }

    /// Resolve the user's cart into priced, named lines joined against
    /// current product data. Prices come from the stored lines; the size
    /// arrays carry *current* stock for the checkout pre-flight.
    pub async fn snapshot(&self, user: &str) -> RepoResult<Vec<CartLine>> {
        let fetched: Vec<FetchedLine> = self
            .base
            .db()
            .query(
                "SELECT * FROM cart_item WHERE user = $user \
                 ORDER BY added_at FETCH product",
            )
            .bind(("user", user.to_string()))
            .await?
            .take(0)?;

        fetched.into_iter().map(FetchedLine::into_cart_line).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::define_schema;
    use crate::db::models::SizeStock;
    use surrealdb::engine::local::Mem;

    async fn test_db() -> Surreal<Db> {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        define_schema(&db).await.unwrap();
        db
    }

    async fn seed_product(db: &Surreal<Db>, key: &str, price: i64, stock_m: i64) -> Product {
        let product = Product {
            id: None,
            name: format!("Product {key}"),
            brand: "Aura".into(),
            description: String::new(),
            categories: vec![],
            tags: vec![],
            colors: vec![],
            images: vec![format!("{key}.webp")],
            price: Decimal::from(price),
            discount_price: Decimal::ZERO,
            sizes: vec![SizeStock { size: SizeLabel::M, stock: stock_m }],
            rating: 0.0,
            num_reviews: 0,
            is_active: true,
        };
        let created: Option<Product> = db
            .create(("product", key))
            .content(product)
            .await
            .unwrap();
        created.unwrap()
    }

    #[tokio::test]
    async fn add_same_pair_increments_quantity() {
        let db = test_db().await;
        seed_product(&db, "tee", 500, 5).await;
        let repo = CartRepository::new(db);

        repo.add("user:1", "tee", SizeLabel::M, 1).await.unwrap();
        let item = repo.add("user:1", "tee", SizeLabel::M, 2).await.unwrap();
        assert_eq!(item.quantity, 3);

        let lines = repo.snapshot("user:1").await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 3);
    }

    #[tokio::test]
    async fn snapshot_keeps_price_at_add_time() {
        let db = test_db().await;
        seed_product(&db, "tee", 500, 5).await;
        let repo = CartRepository::new(db.clone());
        repo.add("user:1", "tee", SizeLabel::M, 2).await.unwrap();

        // Catalog edit after the line was added
        db.query("UPDATE product:tee SET price = 900")
            .await
            .unwrap();

        let lines = repo.snapshot("user:1").await.unwrap();
        assert_eq!(lines[0].unit_price, Decimal::from(500));
        // ...but the stock data is current
        assert_eq!(lines[0].current_stock(), Some(5));
    }

    #[tokio::test]
    async fn add_unknown_size_is_rejected() {
        let db = test_db().await;
        seed_product(&db, "tee", 500, 5).await;
        let repo = CartRepository::new(db);

        let err = repo.add("user:1", "tee", SizeLabel::XXL, 1).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn remove_and_clear() {
        let db = test_db().await;
        seed_product(&db, "tee", 500, 5).await;
        seed_product(&db, "hoodie", 1200, 3).await;
        let repo = CartRepository::new(db);

        repo.add("user:1", "tee", SizeLabel::M, 1).await.unwrap();
        repo.add("user:1", "hoodie", SizeLabel::M, 1).await.unwrap();

        repo.remove("user:1", "tee", SizeLabel::M).await.unwrap();
        assert_eq!(repo.snapshot("user:1").await.unwrap().len(), 1);

        repo.clear("user:1").await.unwrap();
        assert!(repo.snapshot("user:1").await.unwrap().is_empty());
    }
}
