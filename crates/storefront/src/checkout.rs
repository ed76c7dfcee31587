//! Checkout simulation: form validation, totals, and order placement.
//!
//! Stores never validate what they are given; the checkout form is the one
//! place where customer input is checked before an order is built.

use chrono::Local;
use rust_decimal::Decimal;
use template_shop_core::{
    CartItem, CustomerSnapshot, OrderAdmin, OrderCode, OrderProduct, OrderStatus, PaymentMethod,
    SiteSettings,
};
use thiserror::Error;
use tracing::{info, instrument};

use crate::stores::{CartStore, OrderStore};

/// Checkout failures shown to the customer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// Required fields left blank, by field name.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Cart is empty")]
    EmptyCart,

    /// The order store kept nothing.
    #[error("Order could not be recorded")]
    NotRecorded,
}

/// Customer details entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub payment_method: PaymentMethod,
    pub notes: String,
}

impl CheckoutForm {
    /// Check required fields and the email shape.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingFields` listing every blank required
    /// field, or `CheckoutError::InvalidEmail`.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let missing: Vec<&'static str> = [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();
        if !missing.is_empty() {
            return Err(CheckoutError::MissingFields(missing));
        }

        let email = self.email.trim();
        let valid = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid {
            return Err(CheckoutError::InvalidEmail(email.to_string()));
        }
        Ok(())
    }

    fn customer(&self) -> CustomerSnapshot {
        CustomerSnapshot {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }
}

/// Amounts shown on the checkout page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub item_count: u32,
}

impl CheckoutSummary {
    /// Totals for `items` under the shipping rules in `settings`.
    #[must_use]
    pub fn compute(items: &[CartItem], settings: &SiteSettings) -> Self {
        let subtotal: Decimal = items.iter().map(CartItem::line_total).sum();
        let shipping_fee = if items.is_empty() {
            Decimal::ZERO
        } else {
            settings.payments.shipping_fee_for(subtotal)
        };
        Self {
            subtotal,
            shipping_fee,
            total: subtotal + shipping_fee,
            item_count: items.iter().fold(0_u32, |acc, i| acc.saturating_add(i.quantity)),
        }
    }
}

/// Build a pending order from the cart, record it, and empty the cart.
///
/// The order is submitted through the order store, so it is kept locally
/// (with a generated code) even when the backend is down.
///
/// # Errors
///
/// Returns `CheckoutError` if the form is invalid, the cart is empty, or the
/// order store kept nothing. The cart is left untouched on error.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn place_order(
    form: &CheckoutForm,
    cart: &CartStore,
    orders: &OrderStore,
    settings: &SiteSettings,
) -> Result<OrderAdmin, CheckoutError> {
    form.validate()?;
    let items = cart.items();
    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let summary = CheckoutSummary::compute(&items, settings);
    let now = Local::now();
    let order = OrderAdmin {
        id: OrderCode::from_millis(now.timestamp_millis()),
        customer: form.customer(),
        products: items
            .iter()
            .map(|line| OrderProduct {
                name: line.product.name.clone(),
                quantity: line.quantity,
                price: line.product.price,
            })
            .collect(),
        total: summary.total,
        status: OrderStatus::Pending,
        date: now.format("%Y-%m-%d").to_string(),
        address: form.address.trim().to_string(),
        payment_method: form.payment_method,
        notes: form.notes.trim().to_string(),
    };

    let recorded = orders.create(order).await.ok_or(CheckoutError::NotRecorded)?;
    cart.clear_cart().await;
    info!(order = %recorded.id, total = %recorded.total, "Order placed");
    Ok(recorded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use template_shop_core::{Product, ProductId};

    use super::*;
    use crate::test_support::offline_parts;

    fn form() -> CheckoutForm {
        CheckoutForm {
            name: "Nguyễn Văn An".into(),
            email: "an.nguyen@example.com".into(),
            phone: "0901234567".into(),
            address: "123 Lê Lợi, Quận 1".into(),
            payment_method: PaymentMethod::Momo,
            notes: String::new(),
        }
    }

    fn line(id: i64, price: i64, quantity: u32) -> CartItem {
        CartItem {
            product: Product::new(ProductId::new(id), format!("T{id}"), Decimal::from(price)),
            quantity,
        }
    }

    #[test]
    fn test_validate_lists_missing_fields() {
        let blank = CheckoutForm {
            email: "x@y.vn".into(),
            ..CheckoutForm::default()
        };
        assert_eq!(
            blank.validate(),
            Err(CheckoutError::MissingFields(vec!["name", "phone", "address"]))
        );
        assert!(form().validate().is_ok());
    }

    #[test]
    fn test_validate_email_shape() {
        let bad = CheckoutForm {
            email: "not-an-email".into(),
            ..form()
        };
        assert!(matches!(bad.validate(), Err(CheckoutError::InvalidEmail(_))));
    }

    #[test]
    fn test_summary_applies_free_shipping_threshold() {
        let settings = SiteSettings::default();
        let below = CheckoutSummary::compute(&[line(1, 200_000, 2)], &settings);
        assert_eq!(below.subtotal, Decimal::from(400_000));
        assert_eq!(below.shipping_fee, settings.payments.shipping_fee);
        assert_eq!(below.total, Decimal::from(400_000) + settings.payments.shipping_fee);

        let above = CheckoutSummary::compute(&[line(1, 250_000, 2)], &settings);
        assert_eq!(above.shipping_fee, Decimal::ZERO);
        assert_eq!(above.item_count, 2);

        let empty = CheckoutSummary::compute(&[], &settings);
        assert_eq!(empty.total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_place_order_records_pending_order_and_clears_cart() {
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = offline_parts(dir.path()).await;
        let cart = CartStore::new(api.clone(), storage.clone());
        let orders = OrderStore::new(api, storage);
        let mut product = Product::new(ProductId::new(1), "Portfolio Pro", Decimal::from(450_000));
        product.in_stock = true;
        cart.add_to_cart(product).await.unwrap();

        let order = place_order(&form(), &cart, &orders, &SiteSettings::default())
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.id.as_str().starts_with(OrderCode::LOCAL_PREFIX));
        assert_eq!(order.products.len(), 1);
        assert_eq!(order.total, Decimal::from(480_000));
        assert_eq!(order.payment_method, PaymentMethod::Momo);
        assert!(orders.get_by_id(&order.id).is_some());
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_place_order_with_empty_cart() {
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = offline_parts(dir.path()).await;
        let cart = CartStore::new(api.clone(), storage.clone());
        let orders = OrderStore::new(api, storage);

        let err = place_order(&form(), &cart, &orders, &SiteSettings::default())
            .await
            .unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart);
    }
}
