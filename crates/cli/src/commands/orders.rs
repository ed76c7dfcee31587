//! Order and checkout commands.

use template_shop_core::{OrderAdmin, OrderCode, OrderStatus, ProductId};
use template_shop_storefront::checkout::{self, CheckoutForm, CheckoutSummary};
use template_shop_storefront::state::AppState;

use super::CommandError;
use crate::output::{money, print_block, print_lines, warn_if_error};

fn summary(order: &OrderAdmin) -> String {
    format!(
        "{:<16} {:<10} {:<11} {:<24} {:>14}",
        order.id,
        order.date,
        order.status,
        order.customer.name,
        money(order.total)
    )
}

pub async fn list(state: &AppState, status: Option<OrderStatus>, query: Option<&str>) {
    let orders = state.orders();
    orders.ensure_loaded().await;
    warn_if_error("orders", orders.error());

    let mut items = query.map_or_else(|| orders.items(), |q| orders.search(q));
    if let Some(status) = status {
        items.retain(|o| o.status == status);
    }
    print_lines(&items, "No orders", summary);
}

/// Change an order's status.
///
/// Any status is sent unless `strict` is set, in which case only the moves
/// the admin order flow offers are allowed.
pub async fn set_status(
    state: &AppState,
    id: &OrderCode,
    status: OrderStatus,
    strict: bool,
) -> Result<(), CommandError> {
    let orders = state.orders();
    orders.ensure_loaded().await;
    let current = orders
        .get_by_id(id)
        .ok_or_else(|| CommandError::not_found("order", id))?;

    if strict && !current.status.can_transition_to(status) {
        return Err(CommandError::InvalidTransition {
            from: current.status,
            to: status,
        });
    }

    let updated = orders
        .update_order_status(id, status)
        .await
        .ok_or_else(|| CommandError::rejected(orders.error(), "Order status was not changed"))?;
    print_block(&summary(&updated));
    Ok(())
}

pub async fn delete(state: &AppState, id: &OrderCode) -> Result<(), CommandError> {
    let orders = state.orders();
    orders.ensure_loaded().await;
    if !orders.remove(id).await {
        return Err(CommandError::not_found("order", id));
    }
    warn_if_error("orders", orders.error());
    print_block(&format!("Deleted order {id}"));
    Ok(())
}

/// Fill the cart with `items` (one unit per occurrence), then place the
/// order.
pub async fn checkout(
    state: &AppState,
    form: &CheckoutForm,
    items: &[ProductId],
) -> Result<(), CommandError> {
    let (products, cart, settings) = (state.products(), state.cart(), state.settings());
    tokio::join!(
        products.ensure_loaded(),
        cart.ensure_loaded(),
        settings.ensure_loaded()
    );

    for id in items {
        let product = products
            .get_by_id(id)
            .ok_or_else(|| CommandError::not_found("product", id))?;
        cart.add_to_cart(product).await?;
    }

    let site = settings.get();
    let totals = CheckoutSummary::compute(&cart.items(), &site);
    let order = checkout::place_order(form, cart, state.orders(), &site).await?;
    warn_if_error("orders", state.orders().error());

    print_block(&format!(
        "Order {} placed\n  Subtotal  {:>14}\n  Shipping  {:>14}\n  Total     {:>14}\n  Payment   {}",
        order.id,
        money(totals.subtotal),
        money(totals.shipping_fee),
        money(order.total),
        order.payment_method
    ));
    Ok(())
}
