//! Shopping cart store with a sticky offline mode.
//!
//! The cart always applies changes locally first. The backend is told about
//! each change until the first failed call; from then on the store is
//! latched offline for its whole lifetime and never contacts the backend
//! again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::Method;
use rust_decimal::Decimal;
use serde_json::json;
use template_shop_core::{CartItem, Product, ProductId};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::api::{ApiClient, ApiError};
use crate::storage::LocalStorage;
use crate::sync::{Entity, LoadSource, SyncPolicy, SyncStore};

impl Entity for CartItem {
    type Id = ProductId;

    const NAME: &'static str = "cart item";
    const ENDPOINT: &'static str = "cart";
    const POLICY: SyncPolicy = SyncPolicy::LOCAL_FIRST;

    fn id(&self) -> ProductId {
        self.product_id()
    }

    // Cart lines are keyed by product, so there is nothing to assign.
    fn assign_local_id(&mut self, _now_millis: i64) {}
}

/// Errors returned to the caller of a cart operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// The product is marked out of stock and cannot be added.
    #[error("{name} is out of stock")]
    OutOfStock { id: ProductId, name: String },
}

/// Shopping cart store.
///
/// Cheap to clone; clones share items and the offline latch.
#[derive(Clone, Debug)]
pub struct CartStore {
    items: SyncStore<CartItem>,
    offline: Arc<AtomicBool>,
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub fn new(api: ApiClient, storage: LocalStorage) -> Self {
        Self {
            items: SyncStore::new(api, storage),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetch the server-side cart. Failure leaves an empty cart and latches
    /// offline mode. Once offline, returns [`LoadSource::Skipped`] and keeps
    /// the local lines.
    pub async fn load(&self) -> LoadSource {
        if self.is_offline() {
            debug!("Cart is offline, skipping load");
            return LoadSource::Skipped;
        }
        let source = self.items.load().await;
        if source != LoadSource::Remote {
            self.go_offline("load", self.items.error().unwrap_or_default());
        }
        source
    }

    /// Load once, on first use.
    pub async fn ensure_loaded(&self) {
        if !self.is_offline() && !self.items.is_loaded() {
            self.items.ensure_loaded().await;
            if self.items.error().is_some() {
                self.go_offline("load", self.items.error().unwrap_or_default());
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of `product`, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::OutOfStock` without touching the cart when the
    /// product is not in stock.
    #[instrument(skip(self, product), fields(product = %product.id))]
    pub async fn add_to_cart(&self, product: Product) -> Result<CartItem, CartError> {
        if !product.in_stock {
            return Err(CartError::OutOfStock {
                id: product.id,
                name: product.name,
            });
        }
        self.ensure_loaded().await;

        let id = product.id;
        let line = self.items.mutate_local(|items| {
            if let Some(existing) = items.iter_mut().find(|i| i.product_id() == id) {
                existing.quantity = existing.quantity.saturating_add(1);
                existing.clone()
            } else {
                let line = CartItem::single(product);
                items.push(line.clone());
                line
            }
        });

        let body = json!({ "productId": line.product_id(), "quantity": line.quantity });
        self.sync_remote(
            "add",
            self.api()
                .send_ignoring_body(Method::POST, CartItem::ENDPOINT, Some(&body)),
        )
        .await;
        Ok(line)
    }

    /// Set the quantity of a line. A quantity of zero or less removes it.
    ///
    /// Returns the updated line, or `None` if the product is not in the cart
    /// or was removed.
    #[instrument(skip(self), fields(product = %id))]
    pub async fn update_quantity(&self, id: ProductId, quantity: i64) -> Option<CartItem> {
        if quantity <= 0 {
            self.remove_from_cart(id).await;
            return None;
        }
        self.ensure_loaded().await;

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let line = self.items.mutate_local(|items| {
            let existing = items.iter_mut().find(|i| i.product_id() == id)?;
            existing.quantity = quantity;
            Some(existing.clone())
        })?;

        let path = format!("{}/{id}", CartItem::ENDPOINT);
        let body = json!({ "quantity": quantity });
        self.sync_remote(
            "update",
            self.api().send_ignoring_body(Method::PUT, &path, Some(&body)),
        )
        .await;
        Some(line)
    }

    /// Remove a line. Returns whether it was in the cart.
    #[instrument(skip(self), fields(product = %id))]
    pub async fn remove_from_cart(&self, id: ProductId) -> bool {
        self.ensure_loaded().await;

        let removed = self.items.mutate_local(|items| {
            let before = items.len();
            items.retain(|i| i.product_id() != id);
            items.len() != before
        });

        let path = format!("{}/{id}", CartItem::ENDPOINT);
        self.sync_remote("remove", self.api().delete(&path)).await;
        removed
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) {
        self.ensure_loaded().await;
        self.items.mutate_local(Vec::clear);
        self.sync_remote("clear", self.api().delete(CartItem::ENDPOINT))
            .await;
    }

    fn api(&self) -> &ApiClient {
        self.items.api()
    }

    /// Await `call` unless offline; a failure latches offline mode.
    async fn sync_remote(&self, action: &str, call: impl Future<Output = Result<(), ApiError>>) {
        if self.is_offline() {
            debug!(action, "Cart is offline, change kept locally");
            return;
        }
        if let Err(err) = call.await {
            self.go_offline(action, err.to_string());
        }
    }

    fn go_offline(&self, action: &str, reason: String) {
        if !self.offline.swap(true, Ordering::SeqCst) {
            warn!(action, reason = %reason, "Cart backend unavailable, switching to offline mode");
        }
        self.items
            .set_error(format!("Cart is offline; changes are kept on this device ({reason})"));
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Whether the offline latch is set.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Snapshot of the cart lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.items.items()
    }

    /// Last recorded error.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.items.error()
    }

    /// Clear the recorded error. The offline latch stays set.
    pub fn clear_error(&self) {
        self.items.clear_error();
    }

    /// Sum of price × quantity over all lines.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items
            .with_items(|items| items.iter().map(CartItem::line_total).sum())
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items.with_items(|items| {
            items
                .iter()
                .fold(0_u32, |acc, i| acc.saturating_add(i.quantity))
        })
    }

    /// Whether `id` has a line in the cart.
    #[must_use]
    pub fn is_in_cart(&self, id: ProductId) -> bool {
        self.quantity_of(id) > 0
    }

    /// Quantity held for `id`, zero when absent.
    #[must_use]
    pub fn quantity_of(&self, id: ProductId) -> u32 {
        self.items
            .get_by_id(&id)
            .map_or(0, |line| line.quantity)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
