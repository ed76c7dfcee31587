//! Subcommand implementations.
//!
//! Every command loads only the stores it needs, performs one operation and
//! prints the result. Store errors that do not stop the operation (the
//! backend being unreachable for a local-first store) are logged as
//! warnings.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod content;
pub mod orders;
pub mod session;

use template_shop_core::OrderStatus;
use template_shop_storefront::auth::AuthError;
use template_shop_storefront::checkout::CheckoutError;
use template_shop_storefront::stores::{CartError, SettingsStoreError};
use thiserror::Error;

/// Errors that stop a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No entity with that identifier is loaded.
    #[error("No {kind} with id {id}")]
    NotFound { kind: &'static str, id: String },

    /// The store refused the change and kept its previous state.
    #[error("{0}")]
    Rejected(String),

    /// `--strict` status change outside the admin flow.
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Settings(#[from] SettingsStoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Password could not be read.
    #[error("Failed to read password: {0}")]
    Password(String),
}

impl CommandError {
    fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Build a rejection from the message a store recorded.
    fn rejected(error: Option<String>, fallback: &str) -> Self {
        Self::Rejected(error.unwrap_or_else(|| fallback.to_owned()))
    }
}
