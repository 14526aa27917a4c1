//! Review Model
//!
//! Reviews live in their own `review` table keyed by (user, product) with a
//! unique index, one review per buyer per product. The product carries the
//! derived `rating` / `num_reviews` aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// One buyer's review of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Reviewing user id, as issued by the auth collaborator.
    pub user: String,
    /// Reviewer display name, snapshotted at review time.
    pub name: String,
    pub product: RecordId,
    /// 1 to 5, enforced at the request boundary and in the repository.
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
}
