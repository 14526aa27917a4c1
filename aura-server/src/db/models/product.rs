//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Clothing size label. The catalog only carries these five sizes;
/// anything else is rejected at the request boundary by deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeLabel {
    S,
    M,
    L,
    XL,
    XXL,
}

impl std::fmt::Display for SizeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SizeLabel::S => "S",
            SizeLabel::M => "M",
            SizeLabel::L => "L",
            SizeLabel::XL => "XL",
            SizeLabel::XXL => "XXL",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for SizeLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S" => Ok(SizeLabel::S),
            "M" => Ok(SizeLabel::M),
            "L" => Ok(SizeLabel::L),
            "XL" => Ok(SizeLabel::XL),
            "XXL" => Ok(SizeLabel::XXL),
            other => Err(format!("Invalid size label: {other}")),
        }
    }
}

/// Per-size stock counter. Each label appears at most once per product.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SizeStock {
    pub size: SizeLabel,
    /// Never negative; mutated only through the inventory ledger's
    /// conditional decrement (or its compensating release).
    pub stock: i64,
}

/// Product document. Created and updated by the external catalog
/// collaborator; read-only here except for `sizes[].stock`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub description: String,
    /// Record links to category
    #[serde(default)]
    pub categories: Vec<RecordId>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Base price, >= 0
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Discounted price; 0 means no discount. Must be <= price.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub discount_price: Decimal,
    pub sizes: Vec<SizeStock>,
    /// Average review rating, maintained by the review repository.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub num_reviews: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Product {
    /// Effective selling price: the discount price when one is set.
    pub fn final_price(&self) -> Decimal {
        if self.discount_price > Decimal::ZERO {
            self.discount_price
        } else {
            self.price
        }
    }

    /// Sum of stock over all sizes.
    pub fn total_stock(&self) -> i64 {
        self.sizes.iter().map(|s| s.stock).sum()
    }

    /// Current stock for one size label, `None` if the product
    /// does not carry that size.
    pub fn stock_for(&self, size: SizeLabel) -> Option<i64> {
        self.sizes.iter().find(|s| s.size == size).map(|s| s.stock)
    }

    /// First catalog image, used for order item snapshots.
    pub fn first_image(&self) -> Option<String> {
        self.images.first().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: i64, discount: i64) -> Product {
        Product {
            id: None,
            name: "Tee".into(),
            brand: "Aura".into(),
            description: String::new(),
            categories: vec![],
            tags: vec![],
            colors: vec![],
            images: vec!["a.webp".into(), "b.webp".into()],
            price: Decimal::from(price),
            discount_price: Decimal::from(discount),
            sizes: vec![
                SizeStock { size: SizeLabel::M, stock: 5 },
                SizeStock { size: SizeLabel::L, stock: 2 },
            ],
            rating: 0.0,
            num_reviews: 0,
            is_active: true,
        }
    }

    #[test]
    fn final_price_prefers_discount() {
        assert_eq!(product(500, 0).final_price(), Decimal::from(500));
        assert_eq!(product(500, 450).final_price(), Decimal::from(450));
    }

    #[test]
    fn total_stock_sums_sizes() {
        assert_eq!(product(500, 0).total_stock(), 7);
    }

    #[test]
    fn stock_for_missing_size_is_none() {
        let p = product(500, 0);
        assert_eq!(p.stock_for(SizeLabel::M), Some(5));
        assert_eq!(p.stock_for(SizeLabel::XXL), None);
    }
}
