//! Admin view of a customer order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderCode, OrderStatus, PaymentMethod};

/// Point-in-time copy of the customer who placed an order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Order line: a value copy of what was bought, not a catalog reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProduct {
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
}

impl OrderProduct {
    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// An order as managed from the admin back-office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAdmin {
    pub id: OrderCode,
    pub customer: CustomerSnapshot,
    #[serde(default)]
    pub products: Vec<OrderProduct>,
    /// Stored total. Expected to equal [`OrderAdmin::computed_total`] but
    /// nothing enforces it.
    pub total: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: String,
}

impl OrderAdmin {
    /// Sum of `price × quantity` over the lines.
    #[must_use]
    pub fn computed_total(&self) -> Decimal {
        self.products.iter().map(OrderProduct::line_total).sum()
    }

    /// Whether the stored total agrees with the lines.
    #[must_use]
    pub fn total_matches_lines(&self) -> bool {
        self.total == self.computed_total()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.products.iter().map(|p| p.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(total: i64) -> OrderAdmin {
        OrderAdmin {
            id: OrderCode::new("ORD-001"),
            customer: CustomerSnapshot {
                name: "Nguyen Van A".to_string(),
                email: "a@example.com".to_string(),
                phone: "0900000000".to_string(),
            },
            products: vec![
                OrderProduct {
                    name: "Shop template".to_string(),
                    quantity: 2,
                    price: Decimal::from(300_000),
                },
                OrderProduct {
                    name: "Blog template".to_string(),
                    quantity: 1,
                    price: Decimal::from(150_000),
                },
            ],
            total: Decimal::from(total),
            status: OrderStatus::Pending,
            date: "2024-01-15".to_string(),
            address: "Hanoi".to_string(),
            payment_method: PaymentMethod::Cod,
            notes: String::new(),
        }
    }

    #[test]
    fn test_computed_total() {
        assert_eq!(order(750_000).computed_total(), Decimal::from(750_000));
        assert_eq!(order(750_000).item_count(), 3);
    }

    #[test]
    fn test_stored_total_is_not_enforced() {
        let order = order(1);
        assert!(!order.total_matches_lines());
    }

    #[test]
    fn test_decodes_payment_method_field() {
        let json = r#"{"id":"ORD-9","customer":{"name":"B","email":"b@x.vn"},"total":0,"paymentMethod":"bank_transfer","status":"processing"}"#;
        let order: OrderAdmin = serde_json::from_str(json).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(order.payment_method, PaymentMethod::BankTransfer);
        assert_eq!(order.status, OrderStatus::Processing);
        assert!(order.products.is_empty());
    }
}
