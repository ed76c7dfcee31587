//! Terminal formatting shared by the commands.

use rust_decimal::Decimal;
use template_shop_core::{CurrencyCode, Price};

/// Format a VND amount the way the storefront shows it.
pub fn money(amount: Decimal) -> String {
    Price::new(amount, CurrencyCode::VND).display()
}

/// Surface a store's recorded error without failing the command.
///
/// Local-first mutations still succeed when the backend is unreachable, so
/// the error is a warning rather than a failure.
pub fn warn_if_error(store: &str, error: Option<String>) {
    if let Some(error) = error {
        tracing::warn!(store, "{error}");
    }
}

/// Print one line per item, or `empty` when there are none.
#[allow(clippy::print_stdout)]
pub fn print_lines<T>(items: &[T], empty: &str, render: impl Fn(&T) -> String) {
    if items.is_empty() {
        println!("{empty}");
        return;
    }
    for item in items {
        println!("{}", render(item));
    }
}

#[allow(clippy::print_stdout)]
pub fn print_block(text: &str) {
    println!("{text}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_uses_dong_format() {
        assert_eq!(money(Decimal::from(1_250_000)), "1.250.000 ₫");
        assert_eq!(money(Decimal::ZERO), "0 ₫");
    }
}
