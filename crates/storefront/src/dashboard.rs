//! Admin dashboard figures derived from the store snapshots.

use std::cmp::Reverse;

use rust_decimal::Decimal;
use template_shop_core::{OrderAdmin, OrderStatus, Product, User};

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    /// Sum of completed order totals.
    pub revenue: Decimal,
    pub total_orders: usize,
    /// Order count for every status, in [`OrderStatus::ALL`] order.
    pub orders_by_status: Vec<(OrderStatus, usize)>,
    pub total_products: usize,
    pub in_stock_products: usize,
    pub out_of_stock_products: usize,
    pub total_users: usize,
    pub active_users: usize,
    /// Newest orders first.
    pub recent_orders: Vec<OrderAdmin>,
}

impl DashboardStats {
    /// Number of recent orders kept by [`DashboardStats::compute`].
    pub const RECENT_ORDERS: usize = 5;

    #[must_use]
    pub fn compute(products: &[Product], orders: &[OrderAdmin], users: &[User]) -> Self {
        let revenue = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Completed)
            .map(|o| o.total)
            .sum();

        let orders_by_status = OrderStatus::ALL
            .iter()
            .map(|&status| (status, orders.iter().filter(|o| o.status == status).count()))
            .collect();

        let in_stock_products = products.iter().filter(|p| p.in_stock).count();

        let mut recent_orders = orders.to_vec();
        recent_orders.sort_by_key(|o| Reverse(o.date.clone()));
        recent_orders.truncate(Self::RECENT_ORDERS);

        Self {
            revenue,
            total_orders: orders.len(),
            orders_by_status,
            total_products: products.len(),
            in_stock_products,
            out_of_stock_products: products.len() - in_stock_products,
            total_users: users.len(),
            active_users: users.iter().filter(|u| u.is_active()).count(),
            recent_orders,
        }
    }

    /// Orders in `status`.
    #[must_use]
    pub fn count_for(&self, status: OrderStatus) -> usize {
        self.orders_by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, count)| *count)
    }

    /// Orders awaiting processing.
    #[must_use]
    pub fn pending_orders(&self) -> usize {
        self.count_for(OrderStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;

    #[test]
    fn test_stats_over_bundled_data() {
        let stats = DashboardStats::compute(
            &fallback::products(),
            &fallback::orders(),
            &fallback::users(),
        );

        assert_eq!(stats.revenue, Decimal::from(1_250_000));
        assert_eq!(stats.total_orders, 4);
        assert_eq!(stats.pending_orders(), 1);
        assert_eq!(stats.count_for(OrderStatus::Cancelled), 1);
        assert_eq!(stats.in_stock_products, 5);
        assert_eq!(stats.out_of_stock_products, 1);
        assert_eq!(stats.active_users, 3);
        assert_eq!(stats.recent_orders.first().map(|o| o.id.as_str()), Some("ORD004"));
    }

    #[test]
    fn test_empty_inputs() {
        let stats = DashboardStats::compute(&[], &[], &[]);
        assert_eq!(stats.revenue, Decimal::ZERO);
        assert!(stats.recent_orders.is_empty());
        assert_eq!(stats.orders_by_status.len(), OrderStatus::ALL.len());
    }
}
