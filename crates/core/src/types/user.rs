//! Customer and admin accounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{UserId, UserRole, UserStatus};

/// A site account as listed in the admin back-office.
///
/// `total_orders` and `total_spent` are denormalized copies maintained by
/// the backend; order mutations never recompute them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub join_date: String,
    #[serde(default)]
    pub total_orders: u32,
    #[serde(default)]
    pub total_spent: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    /// Whether the account may sign in.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, UserStatus::Active)
    }

    /// Whether the account has back-office access.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}
