//! Cart line item.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Product, ProductId};

/// A product held in the cart together with its quantity.
///
/// The product is embedded by value; later catalog edits do not reach it.
/// Quantity is always at least 1: the cart store removes an item instead of
/// storing a zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Create a line with quantity 1.
    #[must_use]
    pub const fn single(product: Product) -> Self {
        Self {
            product,
            quantity: 1,
        }
    }

    /// Identity of the embedded product.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}
