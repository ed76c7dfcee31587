//! Template Shop Core - Shared domain types.
//!
//! This crate provides the entity types used by every Template Shop component:
//! - `storefront` - API client, local storage and the synchronized entity stores
//! - `cli` - Command-line driver for the stores
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no storage. Wire names follow the remote API (camelCase JSON).
//!
//! # Modules
//!
//! - [`types`] - IDs, money, statuses, entities and the settings singleton

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
