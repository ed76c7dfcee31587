//! Core types for Template Shop.
//!
//! This module provides the domain entities exchanged with the remote API and
//! held by the storefront stores.

pub mod blog;
pub mod cart;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod settings;
pub mod status;
pub mod testimonial;
pub mod user;

pub use blog::BlogPost;
pub use cart::CartItem;
pub use id::*;
pub use order::{CustomerSnapshot, OrderAdmin, OrderProduct};
pub use price::{CurrencyCode, Price};
pub use product::Product;
pub use settings::{
    AboutSettings, AppearanceSettings, ContactSettings, EmailSettings, GeneralSettings,
    NotificationSettings, PaymentSettings, SettingsError, SettingsSection, SiteSettings,
};
pub use status::*;
pub use testimonial::Testimonial;
pub use user::User;
