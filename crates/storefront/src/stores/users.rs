//! Admin user store and derived per-user statistics.

use rust_decimal::Decimal;
use serde_json::json;
use template_shop_core::{OrderAdmin, OrderStatus, User, UserId, UserRole, UserStatus};
use tracing::instrument;

use crate::fallback;
use crate::sync::{Entity, SyncPolicy, SyncStore};

/// User store. Updates wait for the backend.
pub type UserStore = SyncStore<User>;

impl Entity for User {
    type Id = UserId;

    const NAME: &'static str = "user";
    const ENDPOINT: &'static str = "users";
    const POLICY: SyncPolicy = SyncPolicy::CONFIRMED_UPDATES;

    fn id(&self) -> UserId {
        self.id
    }

    fn assign_local_id(&mut self, now_millis: i64) {
        self.id = UserId::new(now_millis);
    }

    fn bundled() -> Vec<Self> {
        fallback::users()
    }
}

impl SyncStore<User> {
    /// Activate, deactivate or suspend an account.
    #[instrument(skip(self), fields(user = %id, status = %status))]
    pub async fn update_user_status(&self, id: UserId, status: UserStatus) -> Option<User> {
        self.update(&id, json!({ "status": status })).await
    }

    /// Change an account's role.
    #[instrument(skip(self), fields(user = %id, role = %role))]
    pub async fn update_user_role(&self, id: UserId, role: UserRole) -> Option<User> {
        self.update(&id, json!({ "role": role })).await
    }

    /// Accounts currently in `status`.
    #[must_use]
    pub fn by_status(&self, status: UserStatus) -> Vec<User> {
        self.filter(|u| u.status == status)
    }

    /// Case-insensitive search over name, email and phone.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<User> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.items();
        }
        self.filter(|u| {
            u.name.to_lowercase().contains(&needle)
                || u.email.to_lowercase().contains(&needle)
                || u.phone.contains(&needle)
        })
    }
}

/// Order statistics for one user, derived from the order collection.
///
/// The stored `total_orders`/`total_spent` on [`User`] are backend copies and
/// may drift; this view is computed on demand and never written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    /// Orders placed with the user's email, any status.
    pub orders_placed: u32,
    /// Completed orders.
    pub completed_orders: u32,
    /// Sum of completed order totals.
    pub total_spent: Decimal,
    /// Date of the most recent order, as stored.
    pub last_order_date: Option<String>,
}

impl UserStats {
    /// Compute statistics by matching orders on the customer email.
    #[must_use]
    pub fn from_orders(user: &User, orders: &[OrderAdmin]) -> Self {
        let mine: Vec<&OrderAdmin> = orders
            .iter()
            .filter(|o| o.customer.email.eq_ignore_ascii_case(&user.email))
            .collect();
        let completed: Vec<&&OrderAdmin> = mine
            .iter()
            .filter(|o| o.status == OrderStatus::Completed)
            .collect();

        Self {
            orders_placed: u32::try_from(mine.len()).unwrap_or(u32::MAX),
            completed_orders: u32::try_from(completed.len()).unwrap_or(u32::MAX),
            total_spent: completed.iter().map(|o| o.total).sum(),
            last_order_date: mine.iter().map(|o| o.date.clone()).max(),
        }
    }

    /// Whether the user's stored aggregates agree with this view.
    #[must_use]
    pub fn matches_stored(&self, user: &User) -> bool {
        self.completed_orders == user.total_orders && self.total_spent == user.total_spent
    }
}
