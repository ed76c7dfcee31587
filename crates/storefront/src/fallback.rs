//! Bundled datasets used when the backend cannot be reached on first load.

use serde::de::DeserializeOwned;
use template_shop_core::{BlogPost, OrderAdmin, Product, Testimonial, User};
use tracing::error;

const PRODUCTS: &str = include_str!("../data/products.json");
const ORDERS: &str = include_str!("../data/orders.json");
const USERS: &str = include_str!("../data/users.json");
const TESTIMONIALS: &str = include_str!("../data/testimonials.json");
const BLOG_POSTS: &str = include_str!("../data/blog.json");

fn parse<T: DeserializeOwned>(name: &str, raw: &str) -> Vec<T> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        error!(dataset = name, error = %e, "Bundled dataset is malformed");
        Vec::new()
    })
}

/// Demo catalog.
#[must_use]
pub fn products() -> Vec<Product> {
    parse("products", PRODUCTS)
}

/// Demo orders.
#[must_use]
pub fn orders() -> Vec<OrderAdmin> {
    parse("orders", ORDERS)
}

/// Demo customer and admin accounts.
#[must_use]
pub fn users() -> Vec<User> {
    parse("users", USERS)
}

/// Demo testimonials.
#[must_use]
pub fn testimonials() -> Vec<Testimonial> {
    parse("testimonials", TESTIMONIALS)
}

/// Demo blog posts.
#[must_use]
pub fn blog_posts() -> Vec<BlogPost> {
    parse("blog_posts", BLOG_POSTS)
}
