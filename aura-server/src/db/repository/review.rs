//! Review Repository
//!
//! Only buyers review: a review is accepted only when the user has a
//! `Delivered` order containing the product, and at most once per
//! (user, product). The product's `rating` / `num_reviews` aggregates are
//! recomputed from the review table after every accepted review.

use chrono::Utc;
use surrealdb::Surreal;
use surrealdb::RecordId;
use surrealdb::engine::local::Db;
use thiserror::Error;

use super::product::PRODUCT_TABLE;
use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{OrderStatus, Product, Review};
use crate::utils::AppError;

const REVIEW_TABLE: &str = "review";

/// Review errors
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Only buyers can review this product")]
    NotABuyer,

    #[error("You already reviewed this product")]
    AlreadyReviewed,

    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange,

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<surrealdb::Error> for ReviewError {
    fn from(err: surrealdb::Error) -> Self {
        ReviewError::Repo(RepoError::Database(err.to_string()))
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::ProductNotFound(id) => AppError::not_found(format!("Product {id}")),
            ReviewError::NotABuyer => AppError::forbidden("Only buyers can review this product"),
            ReviewError::AlreadyReviewed => AppError::conflict("You already reviewed this product"),
            ReviewError::RatingOutOfRange => {
                AppError::validation("Rating must be between 1 and 5")
            }
            ReviewError::Repo(e) => e.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReviewRepository {
    base: BaseRepository,
}

impl ReviewRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Record a buyer's review and refresh the product's rating aggregates.
    pub async fn add(
        &self,
        user: &str,
        name: &str,
        product_id: &str,
        rating: i64,
        comment: String,
    ) -> Result<Review, ReviewError> {
        if !(1..=5).contains(&rating) {
            return Err(ReviewError::RatingOutOfRange);
        }

        let record_id = parse_record_id(PRODUCT_TABLE, product_id);
        let product: Option<Product> = self.base.db().select(record_id.clone()).await?;
        if product.filter(|p| p.is_active).is_none() {
            return Err(ReviewError::ProductNotFound(product_id.to_string()));
        }

        if !self.has_purchased(user, &record_id).await? {
            return Err(ReviewError::NotABuyer);
        }

        let review = Review {
            id: None,
            user: user.to_string(),
            name: name.to_string(),
            product: record_id.clone(),
            rating,
            comment,
            created_at: Utc::now(),
        };
        let created: Option<Review> = self
            .base
            .db()
            .create(REVIEW_TABLE)
            .content(review)
            .await
            .map_err(|e| {
                // Unique index violation: this user already reviewed
                let msg = e.to_string();
                if msg.contains("review_owner") {
                    ReviewError::AlreadyReviewed
                } else {
                    ReviewError::Repo(RepoError::Database(msg))
                }
            })?;
        let created =
            created.ok_or_else(|| ReviewError::Repo(RepoError::Database("review not created".into())))?;

        self.refresh_aggregates(&record_id).await?;
        Ok(created)
    }

    /// List a product's reviews, newest first.
    pub async fn find_by_product(&self, product_id: &str) -> RepoResult<Vec<Review>> {
        let record_id = parse_record_id(PRODUCT_TABLE, product_id);
        let reviews: Vec<Review> = self
            .base
            .db()
            .query("SELECT * FROM review WHERE product = $product ORDER BY created_at DESC")
            .bind(("product", record_id))
            .await?
            .take(0)?;
        Ok(reviews)
    }

    /// A user has purchased a product once some `Delivered` order of theirs
    /// contains it.
    async fn has_purchased(&self, user: &str, product: &RecordId) -> Result<bool, ReviewError> {
        let delivered: Option<RecordId> = self
            .base
            .db()
            .query(
                "SELECT VALUE id FROM orders \
                 WHERE user = $user AND order_status = $delivered \
                     AND array::len(items[WHERE product = $product]) > 0 \
                 LIMIT 1",
            )
            .bind(("user", user.to_string()))
            .bind(("delivered", OrderStatus::Delivered))
            .bind(("product", product.clone()))
            .await?
            .take(0)?;
        Ok(delivered.is_some())
    }

    /// Recompute the product's average rating and review count from the
    /// review table.
    async fn refresh_aggregates(&self, product: &RecordId) -> Result<(), ReviewError> {
        self.base
            .db()
            .query(
                "LET $ratings = (SELECT VALUE rating FROM review WHERE product = $product); \
                 UPDATE $product SET \
                     rating = IF array::len($ratings) > 0 THEN math::mean($ratings) ELSE 0.0 END, \
                     num_reviews = array::len($ratings);",
            )
            .bind(("product", product.clone()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::define_schema;
    use crate::db::models::{
        Order, OrderItem, PaymentMethod, PaymentStatus, ShippingAddress, SizeLabel, SizeStock,
    };
    use rust_decimal::Decimal;
    use surrealdb::engine::local::Mem;

    async fn test_db() -> Surreal<Db> {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        define_schema(&db).await.unwrap();
        db
    }

    async fn seed_product(db: &Surreal<Db>, key: &str) -> RecordId {
        let product = Product {
            id: None,
            name: format!("Product {key}"),
            brand: "Aura".into(),
            description: String::new(),
            categories: vec![],
            tags: vec![],
            colors: vec![],
            images: vec![],
            price: Decimal::from(500),
            discount_price: Decimal::ZERO,
            sizes: vec![SizeStock { size: SizeLabel::M, stock: 5 }],
            rating: 0.0,
            num_reviews: 0,
            is_active: true,
        };
        let created: Option<Product> = db.create(("product", key)).content(product).await.unwrap();
        created.unwrap().id.unwrap()
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Asha Rao".into(),
            mobile: "9999999999".into(),
            address_line: "12 MG Road".into(),
            city: "Bengaluru".into(),
            state: "KA".into(),
            pincode: "560001".into(),
        }
    }

    async fn seed_order(db: &Surreal<Db>, user: &str, product: &RecordId, status: OrderStatus) {
        let mut order = Order::new(
            user.to_string(),
            vec![OrderItem {
                product: product.clone(),
                name: "Tee".into(),
                image: None,
                size: SizeLabel::M,
                quantity: 1,
                unit_price: Decimal::from(500),
            }],
            address(),
            PaymentMethod::Cod,
            PaymentStatus::Paid,
        );
        order.order_status = status;
        let _: Option<Order> = db.create("orders").content(order).await.unwrap();
    }

    async fn product_of(db: &Surreal<Db>, id: &RecordId) -> Product {
        let product: Option<Product> = db.select(id.clone()).await.unwrap();
        product.unwrap()
    }

    #[tokio::test]
    async fn buyer_review_updates_aggregates() {
        let db = test_db().await;
        let id = seed_product(&db, "tee").await;
        seed_order(&db, "user:1", &id, OrderStatus::Delivered).await;
        let repo = ReviewRepository::new(db.clone());

        let review = repo
            .add("user:1", "Asha", "tee", 4, "Fits well".into())
            .await
            .unwrap();
        assert_eq!(review.rating, 4);

        let product = product_of(&db, &id).await;
        assert_eq!(product.num_reviews, 1);
        assert_eq!(product.rating, 4.0);
    }

    #[tokio::test]
    async fn ratings_average_across_buyers() {
        let db = test_db().await;
        let id = seed_product(&db, "tee").await;
        seed_order(&db, "user:1", &id, OrderStatus::Delivered).await;
        seed_order(&db, "user:2", &id, OrderStatus::Delivered).await;
        let repo = ReviewRepository::new(db.clone());

        repo.add("user:1", "Asha", "tee", 4, String::new()).await.unwrap();
        repo.add("user:2", "Ravi", "tee", 5, String::new()).await.unwrap();

        let product = product_of(&db, &id).await;
        assert_eq!(product.num_reviews, 2);
        assert_eq!(product.rating, 4.5);

        let reviews = repo.find_by_product("tee").await.unwrap();
        assert_eq!(reviews.len(), 2);
    }

    #[tokio::test]
    async fn non_buyer_is_rejected() {
        let db = test_db().await;
        let id = seed_product(&db, "tee").await;
        // An order that never reached Delivered does not qualify
        seed_order(&db, "user:1", &id, OrderStatus::Shipped).await;
        let repo = ReviewRepository::new(db.clone());

        let err = repo
            .add("user:1", "Asha", "tee", 4, String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::NotABuyer));

        let err = repo
            .add("user:9", "Maya", "tee", 4, String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::NotABuyer));

        assert_eq!(product_of(&db, &id).await.num_reviews, 0);
    }

    #[tokio::test]
    async fn second_review_from_same_buyer_is_rejected() {
        let db = test_db().await;
        let id = seed_product(&db, "tee").await;
        seed_order(&db, "user:1", &id, OrderStatus::Delivered).await;
        let repo = ReviewRepository::new(db.clone());

        repo.add("user:1", "Asha", "tee", 4, String::new()).await.unwrap();
        let err = repo
            .add("user:1", "Asha", "tee", 5, String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::AlreadyReviewed));

        let product = product_of(&db, &id).await;
        assert_eq!(product.num_reviews, 1);
        assert_eq!(product.rating, 4.0);
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected() {
        let db = test_db().await;
        seed_product(&db, "tee").await;
        let repo = ReviewRepository::new(db);

        for rating in [0, 6, -1] {
            let err = repo
                .add("user:1", "Asha", "tee", rating, String::new())
                .await
                .unwrap_err();
            assert!(matches!(err, ReviewError::RatingOutOfRange));
        }
    }
}
