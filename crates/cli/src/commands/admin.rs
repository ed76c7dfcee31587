//! Admin back-office commands: users, settings and the dashboard.
//!
//! # Usage
//!
//! ```bash
//! shop-cli users list --status active
//! shop-cli users role 2 admin
//! shop-cli settings get payments
//! shop-cli settings set general siteName "Template Shop"
//! shop-cli dashboard
//! ```

use serde_json::Value;
use template_shop_core::{OrderStatus, SettingsSection, User, UserId, UserRole, UserStatus};
use template_shop_storefront::state::AppState;
use template_shop_storefront::stores::UserStats;

use super::CommandError;
use crate::output::{money, print_block, print_lines, warn_if_error};

fn user_line(user: &User) -> String {
    format!(
        "{:>4}  {:<24} {:<30} {:<8} {:<9} {:>3} orders {:>14}",
        user.id,
        user.name,
        user.email,
        user.role,
        user.status,
        user.total_orders,
        money(user.total_spent)
    )
}

pub async fn list_users(state: &AppState, status: Option<UserStatus>, query: Option<&str>) {
    let users = state.users();
    users.ensure_loaded().await;
    warn_if_error("users", users.error());

    let mut items = query.map_or_else(|| users.items(), |q| users.search(q));
    if let Some(status) = status {
        items.retain(|u| u.status == status);
    }
    print_lines(&items, "No users", user_line);
}

/// Show a user with figures recomputed from the order list.
pub async fn show_user(state: &AppState, id: UserId) -> Result<(), CommandError> {
    let (users, orders) = (state.users(), state.orders());
    tokio::join!(users.ensure_loaded(), orders.ensure_loaded());

    let user = users
        .get_by_id(&id)
        .ok_or_else(|| CommandError::not_found("user", id))?;
    let stats = orders.with_items(|items| UserStats::from_orders(&user, items));

    let mut text = format!(
        "{}\n  Joined          {}\n  Phone           {}\n  Orders placed   {}\n  Completed       {}\n  Spent           {}\n  Last order      {}",
        user_line(&user),
        user.join_date,
        user.phone,
        stats.orders_placed,
        stats.completed_orders,
        money(stats.total_spent),
        stats.last_order_date.as_deref().unwrap_or("-"),
    );
    if !stats.matches_stored(&user) {
        text.push_str("\n  (stored totals differ from the order list)");
    }
    print_block(&text);
    Ok(())
}

pub async fn set_user_status(
    state: &AppState,
    id: UserId,
    status: UserStatus,
) -> Result<(), CommandError> {
    let users = state.users();
    users.ensure_loaded().await;
    let updated = users
        .update_user_status(id, status)
        .await
        .ok_or_else(|| CommandError::rejected(users.error(), "User status was not changed"))?;
    print_block(&user_line(&updated));
    Ok(())
}

pub async fn set_user_role(state: &AppState, id: UserId, role: UserRole) -> Result<(), CommandError> {
    let users = state.users();
    users.ensure_loaded().await;
    let updated = users
        .update_user_role(id, role)
        .await
        .ok_or_else(|| CommandError::rejected(users.error(), "User role was not changed"))?;
    print_block(&user_line(&updated));
    Ok(())
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub async fn show_settings(
    state: &AppState,
    section: Option<SettingsSection>,
) -> Result<(), CommandError> {
    let settings = state.settings();
    settings.ensure_loaded().await;
    warn_if_error("settings", settings.error());

    let sections = section.map_or_else(|| SettingsSection::ALL.to_vec(), |s| vec![s]);
    for section in sections {
        let value = settings
            .section(section)
            .map_err(|e| CommandError::Settings(e.into()))?;
        print_block(&format!("[{section}]\n{}", pretty(&value)));
    }
    Ok(())
}

/// Parse a command-line value as JSON, taking bare words as strings.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

/// Change one field, then push the whole document.
pub async fn set_setting(
    state: &AppState,
    section: SettingsSection,
    field: &str,
    raw: &str,
) -> Result<(), CommandError> {
    let settings = state.settings();
    settings.ensure_loaded().await;
    let updated = settings.update(section, field, parse_value(raw)).await?;

    if !settings.save().await {
        warn_if_error("settings", settings.error());
        tracing::warn!("Settings kept locally only");
    }
    let value = updated
        .section_value(section)
        .map_err(|e| CommandError::Settings(e.into()))?;
    print_block(&format!("[{section}]\n{}", pretty(&value)));
    Ok(())
}

pub async fn reset_settings(state: &AppState) -> Result<(), CommandError> {
    let settings = state.settings();
    if !settings.reset().await {
        warn_if_error("settings", settings.error());
        tracing::warn!("Defaults restored locally only");
    }
    print_block("Settings restored to defaults");
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn dashboard(state: &AppState) {
    let (products, orders, users) = (state.products(), state.orders(), state.users());
    tokio::join!(
        products.ensure_loaded(),
        orders.ensure_loaded(),
        users.ensure_loaded()
    );
    for (store, error) in [
        ("products", products.error()),
        ("orders", orders.error()),
        ("users", users.error()),
    ] {
        warn_if_error(store, error);
    }

    let stats = state.dashboard();
    println!("Revenue          {}", money(stats.revenue));
    println!("Orders           {}", stats.total_orders);
    for status in OrderStatus::ALL {
        println!("  {status:<14} {}", stats.count_for(status));
    }
    println!(
        "Products         {} ({} in stock, {} out of stock)",
        stats.total_products, stats.in_stock_products, stats.out_of_stock_products
    );
    println!("Users            {} ({} active)", stats.total_users, stats.active_users);
    println!("\nRecent orders");
    for order in &stats.recent_orders {
        println!(
            "  {:<16} {:<10} {:<11} {:>14}",
            order.id,
            order.date,
            order.status,
            money(order.total)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_accepts_json_and_bare_words() {
        assert_eq!(parse_value("1000000"), Value::from(1_000_000));
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("\"quoted\""), Value::from("quoted"));
        assert_eq!(parse_value("Template Shop"), Value::from("Template Shop"));
    }
}
