//! Product catalog entry.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::ProductId;

/// A template/product offered in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    /// Average review score, 0 to 5.
    #[serde(default)]
    pub rating: f64,
    /// Number of reviews behind `rating`.
    #[serde(default)]
    pub reviews: u32,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    /// Promotional tag such as "Hot" or "New".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
}

const fn default_in_stock() -> bool {
    true
}

impl Product {
    /// Create a product with the required fields; everything else defaults.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            original_price: None,
            image: String::new(),
            category: String::new(),
            description: String::new(),
            features: Vec::new(),
            rating: 0.0,
            reviews: 0,
            in_stock: true,
            badge: None,
            seo_title: None,
            seo_description: None,
            og_image: None,
        }
    }

    /// Whole-percent discount when `original_price` is above `price`.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price?;
        if original <= self.price || original.is_zero() {
            return None;
        }
        let pct = (original - self.price) * Decimal::from(100) / original;
        pct.round().to_u32()
    }

    /// Rating clamped into the 0 to 5 range.
    #[must_use]
    pub fn clamped_rating(&self) -> f64 {
        self.rating.clamp(0.0, 5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_percent() {
        let mut product = Product::new(ProductId::new(1), "Landing", Decimal::from(750_000));
        assert_eq!(product.discount_percent(), None);

        product.original_price = Some(Decimal::from(1_000_000));
        assert_eq!(product.discount_percent(), Some(25));

        product.original_price = Some(Decimal::from(500_000));
        assert_eq!(product.discount_percent(), None);
    }

    #[test]
    fn test_decodes_camel_case_with_defaults() {
        let json = r#"{"id":7,"name":"Shop","price":"450000","originalPrice":600000,"inStock":false}"#;
        let product: Product = serde_json::from_str(json).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(product.id, ProductId::new(7));
        assert_eq!(product.original_price, Some(Decimal::from(600_000)));
        assert!(!product.in_stock);
        assert!(product.features.is_empty());
    }

    #[test]
    fn test_in_stock_defaults_to_true() {
        let product: Product = serde_json::from_str(r#"{"id":1,"name":"A","price":1}"#)
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(product.in_stock);
    }
}
