//! Template Shop storefront library.
//!
//! Keeps the storefront and admin state for a template e-commerce site in
//! sync with its REST backend, falling back to local storage or bundled data
//! when the backend is unreachable.
//!
//! # Modules
//!
//! - [`api`] - REST client and response envelope decoding
//! - [`storage`] - Durable local key-value layer with change notifications
//! - [`sync`] - Generic synchronized entity store
//! - [`stores`] - Product, order, user, cart, testimonial, blog and settings stores
//! - [`auth`], [`checkout`], [`dashboard`], [`content`] - Features built on the stores
//! - [`state`] - [`AppState`](state::AppState), the handle that owns everything

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod checkout;
pub mod config;
pub mod content;
pub mod dashboard;
pub mod error;
pub mod fallback;
pub mod state;
pub mod storage;
pub mod stores;
pub mod sync;

#[cfg(test)]
mod test_support;
