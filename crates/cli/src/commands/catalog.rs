//! Product catalog commands.

use template_shop_core::{Product, ProductId};
use template_shop_storefront::state::AppState;

use super::CommandError;
use crate::output::{money, print_block, print_lines, warn_if_error};

/// Related products shown under a product.
const RELATED_LIMIT: usize = 3;

fn summary(product: &Product) -> String {
    let stock = if product.in_stock { "" } else { " (out of stock)" };
    let badge = product
        .badge
        .as_deref()
        .map(|b| format!(" [{b}]"))
        .unwrap_or_default();
    format!(
        "{:>4}  {:<40} {:>14}  {}{badge}{stock}",
        product.id,
        product.name,
        money(product.price),
        product.category
    )
}

pub async fn list(state: &AppState, category: Option<&str>, in_stock: bool, featured: bool) {
    let products = state.products();
    products.ensure_loaded().await;
    warn_if_error("products", products.error());

    let mut items = match category {
        Some(category) => products.by_category(category),
        None => products.items(),
    };
    if in_stock {
        items.retain(|p| p.in_stock);
    }
    if featured {
        items.retain(|p| p.badge.is_some());
    }
    print_lines(&items, "No products", summary);
}

pub async fn search(state: &AppState, term: &str) {
    let products = state.products();
    products.ensure_loaded().await;
    warn_if_error("products", products.error());
    print_lines(&products.search(term), "No matching products", summary);
}

pub async fn show(state: &AppState, id: ProductId) -> Result<(), CommandError> {
    let products = state.products();
    products.ensure_loaded().await;
    warn_if_error("products", products.error());

    let product = products
        .get_by_id(&id)
        .ok_or_else(|| CommandError::not_found("product", id))?;

    let mut text = format!("{}\n{}\n", product.name, summary(&product));
    if let (Some(original), Some(percent)) = (product.original_price, product.discount_percent()) {
        text.push_str(&format!("Was {} (-{percent}%)\n", money(original)));
    }
    text.push_str(&format!(
        "Rating {:.1} from {} reviews\n\n{}\n",
        product.clamped_rating(),
        product.reviews,
        product.description
    ));
    for feature in &product.features {
        text.push_str(&format!("  - {feature}\n"));
    }

    let related = products.related(id, RELATED_LIMIT);
    if !related.is_empty() {
        text.push_str("\nRelated:\n");
        for other in &related {
            text.push_str(&format!("  {}\n", summary(other)));
        }
    }
    print_block(text.trim_end());
    Ok(())
}

pub async fn categories(state: &AppState) {
    let products = state.products();
    products.ensure_loaded().await;
    warn_if_error("products", products.error());
    print_lines(&products.categories(), "No categories", |c| {
        format!("{c} ({})", products.by_category(c).len())
    });
}
