//! Admin order store.

use serde_json::json;
use template_shop_core::{OrderAdmin, OrderCode, OrderStatus};
use tracing::instrument;

use crate::fallback;
use crate::sync::{Entity, SyncPolicy, SyncStore};

/// Order store. Updates wait for the backend.
pub type OrderStore = SyncStore<OrderAdmin>;

impl Entity for OrderAdmin {
    type Id = OrderCode;

    const NAME: &'static str = "order";
    const ENDPOINT: &'static str = "orders";
    const POLICY: SyncPolicy = SyncPolicy::CONFIRMED_UPDATES;

    fn id(&self) -> OrderCode {
        self.id.clone()
    }

    fn assign_local_id(&mut self, now_millis: i64) {
        self.id = OrderCode::from_millis(now_millis);
    }

    fn bundled() -> Vec<Self> {
        fallback::orders()
    }
}

impl SyncStore<OrderAdmin> {
    /// Set an order's status.
    ///
    /// Any status is accepted, including moves that
    /// [`OrderStatus::can_transition_to`] disallows; enforcing the admin
    /// flow is left to the caller.
    #[instrument(skip(self), fields(order = %id, status = %status))]
    pub async fn update_order_status(&self, id: &OrderCode, status: OrderStatus) -> Option<OrderAdmin> {
        self.update(id, json!({ "status": status })).await
    }

    /// Orders currently in `status`.
    #[must_use]
    pub fn by_status(&self, status: OrderStatus) -> Vec<OrderAdmin> {
        self.filter(|o| o.status == status)
    }

    /// Case-insensitive search over order code, customer name and email.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<OrderAdmin> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.items();
        }
        self.filter(|o| {
            o.id.as_str().to_lowercase().contains(&needle)
                || o.customer.name.to_lowercase().contains(&needle)
                || o.customer.email.to_lowercase().contains(&needle)
        })
    }

    /// Orders placed by the customer with `email` (case-insensitive).
    #[must_use]
    pub fn for_customer(&self, email: &str) -> Vec<OrderAdmin> {
        self.filter(|o| o.customer.email.eq_ignore_ascii_case(email))
    }
}
