//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information, used for display.
///
/// Entities carry bare `Decimal` amounts; the currency comes from the site
/// settings (`general.currency`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Format for display, e.g. `1.250.000 ₫` or `$19.99`.
    #[must_use]
    pub fn display(&self) -> String {
        let code = self.currency_code;
        let rounded = self
            .amount
            .round_dp_with_strategy(code.minor_units(), RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let text = rounded.abs().to_string();
        let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));

        let mut grouped = group_thousands(whole, code.group_separator());
        if code.minor_units() > 0 {
            grouped.push(code.decimal_separator());
            grouped.push_str(&format!("{frac:0<width$}", width = code.minor_units() as usize));
        }

        let sign = if negative { "-" } else { "" };
        if code.symbol_first() {
            format!("{sign}{}{grouped}", code.symbol())
        } else {
            format!("{sign}{grouped} {}", code.symbol())
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

fn group_thousands(digits: &str, separator: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

/// ISO 4217 currency codes supported by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    VND,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::VND => "₫",
            Self::USD => "$",
            Self::EUR => "€",
        }
    }

    /// Number of decimal places shown.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::VND => 0,
            Self::USD | Self::EUR => 2,
        }
    }

    const fn symbol_first(self) -> bool {
        matches!(self, Self::USD)
    }

    const fn group_separator(self) -> char {
        match self {
            Self::VND | Self::EUR => '.',
            Self::USD => ',',
        }
    }

    const fn decimal_separator(self) -> char {
        match self {
            Self::VND | Self::EUR => ',',
            Self::USD => '.',
        }
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VND" => Ok(Self::VND),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}
