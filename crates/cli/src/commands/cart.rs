//! Cart commands.
//!
//! The cart lives on the backend; once a call fails the store works offline
//! and changes last only for this invocation.

use template_shop_core::{CartItem, ProductId};
use template_shop_storefront::state::AppState;

use super::CommandError;
use crate::output::{money, print_block, print_lines, warn_if_error};

fn line(item: &CartItem) -> String {
    format!(
        "{:>4}  {:<40} x{:<3} {:>14}",
        item.product.id,
        item.product.name,
        item.quantity,
        money(item.line_total())
    )
}

pub async fn show(state: &AppState) {
    let cart = state.cart();
    cart.ensure_loaded().await;
    warn_if_error("cart", cart.error());

    print_lines(&cart.items(), "Cart is empty", line);
    if !cart.is_empty() {
        print_block(&format!(
            "{} items, total {}",
            cart.total_items(),
            money(cart.total_price())
        ));
    }
}

/// Add `quantity` units of a product, one add per unit.
pub async fn add(state: &AppState, id: ProductId, quantity: u32) -> Result<(), CommandError> {
    let products = state.products();
    products.ensure_loaded().await;
    let product = products
        .get_by_id(&id)
        .ok_or_else(|| CommandError::not_found("product", id))?;

    let cart = state.cart();
    cart.ensure_loaded().await;
    for _ in 0..quantity {
        cart.add_to_cart(product.clone()).await?;
    }
    warn_if_error("cart", cart.error());
    show(state).await;
    Ok(())
}

pub async fn set(state: &AppState, id: ProductId, quantity: i64) {
    let cart = state.cart();
    cart.ensure_loaded().await;
    if cart.update_quantity(id, quantity).await.is_none() && quantity > 0 {
        tracing::warn!(product = %id, "Product is not in the cart");
    }
    warn_if_error("cart", cart.error());
    show(state).await;
}

pub async fn remove(state: &AppState, id: ProductId) {
    let cart = state.cart();
    cart.ensure_loaded().await;
    if !cart.remove_from_cart(id).await {
        tracing::warn!(product = %id, "Product is not in the cart");
    }
    warn_if_error("cart", cart.error());
    show(state).await;
}

pub async fn clear(state: &AppState) {
    let cart = state.cart();
    cart.ensure_loaded().await;
    cart.clear_cart().await;
    warn_if_error("cart", cart.error());
    show(state).await;
}
