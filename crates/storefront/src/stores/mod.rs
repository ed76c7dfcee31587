//! Per-entity stores built on the generic sync engine.
//!
//! | Store | Endpoint | Updates | Persisted |
//! |-------|----------|---------|-----------|
//! | [`ProductStore`] | `products` | wait for backend | no |
//! | [`OrderStore`] | `orders` | wait for backend | no |
//! | [`UserStore`] | `users` | wait for backend | no |
//! | [`CartStore`] | `cart` | local first, sticky offline | no |
//! | [`TestimonialStore`] | `testimonials` | local first | `testimonials` |
//! | [`BlogStore`] | `blog` | local first | `blog_posts` |
//! | [`SettingsStore`] | `settings` | local, pushed on save | `site_settings` |

pub mod blog;
pub mod cart;
pub mod orders;
pub mod products;
pub mod settings;
pub mod testimonials;
pub mod users;

pub use blog::BlogStore;
pub use cart::{CartError, CartStore};
pub use orders::OrderStore;
pub use products::ProductStore;
pub use settings::{SettingsStore, SettingsStoreError};
pub use testimonials::TestimonialStore;
pub use users::{UserStats, UserStore};
