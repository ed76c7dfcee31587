//! Product catalog store.

use template_shop_core::{Product, ProductId};

use crate::fallback;
use crate::sync::{Entity, SyncPolicy, SyncStore};

/// Catalog store. Updates wait for the backend.
pub type ProductStore = SyncStore<Product>;

impl Entity for Product {
    type Id = ProductId;

    const NAME: &'static str = "product";
    const ENDPOINT: &'static str = "products";
    const POLICY: SyncPolicy = SyncPolicy::CONFIRMED_UPDATES;

    fn id(&self) -> ProductId {
        self.id
    }

    fn assign_local_id(&mut self, now_millis: i64) {
        self.id = ProductId::new(now_millis);
    }

    fn bundled() -> Vec<Self> {
        fallback::products()
    }
}

impl SyncStore<Product> {
    /// Products in `category` (exact match).
    #[must_use]
    pub fn by_category(&self, category: &str) -> Vec<Product> {
        self.filter(|p| p.category == category)
    }

    /// Distinct categories in order of first appearance.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.with_items(|items| {
            let mut seen: Vec<String> = Vec::new();
            for product in items {
                if !seen.contains(&product.category) {
                    seen.push(product.category.clone());
                }
            }
            seen
        })
    }

    /// Case-insensitive search over name, description and category.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<Product> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.items();
        }
        self.filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
                || p.category.to_lowercase().contains(&needle)
        })
    }

    /// Products that can be added to the cart.
    #[must_use]
    pub fn in_stock(&self) -> Vec<Product> {
        self.filter(|p| p.in_stock)
    }

    /// Up to `limit` other products from the same category.
    #[must_use]
    pub fn related(&self, id: ProductId, limit: usize) -> Vec<Product> {
        let Some(product) = self.get_by_id(&id) else {
            return Vec::new();
        };
        self.with_items(|items| {
            items
                .iter()
                .filter(|p| p.id != id && p.category == product.category)
                .take(limit)
                .cloned()
                .collect()
        })
    }

    /// Products carrying a promotional badge.
    #[must_use]
    pub fn featured(&self) -> Vec<Product> {
        self.filter(|p| p.badge.is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::sync::LoadSource;
    use crate::test_support::{offline_parts, parts_for};

    async fn offline_store() -> (ProductStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = offline_parts(dir.path()).await;
        let store = ProductStore::new(api, storage);
        store.ensure_loaded().await;
        (store, dir)
    }

    #[tokio::test]
    async fn test_load_failure_falls_back_to_bundled_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = offline_parts(dir.path()).await;
        let store = ProductStore::new(api, storage);

        assert_eq!(store.load().await, LoadSource::Bundled);
        assert_eq!(store.len(), 6);
        assert!(store.error().is_some());
    }

    #[tokio::test]
    async fn test_categories_keep_first_appearance_order() {
        let (store, _dir) = offline_store().await;
        assert_eq!(
            store.categories(),
            vec!["E-commerce", "Portfolio", "Business", "Education"]
        );
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let (store, _dir) = offline_store().await;
        let hits = store.search("BOOKING");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, ProductId::new(3));
        assert_eq!(store.search("  ").len(), 6);
    }

    #[tokio::test]
    async fn test_related_excludes_self() {
        let (store, _dir) = offline_store().await;
        let related = store.related(ProductId::new(1), 4);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].id, ProductId::new(5));
        assert!(store.related(ProductId::new(999), 4).is_empty());
    }

    #[tokio::test]
    async fn test_stock_and_featured_filters() {
        let (store, _dir) = offline_store().await;
        assert_eq!(store.in_stock().len(), 5);
        assert_eq!(store.featured().len(), 3);
        assert_eq!(store.by_category("Business").len(), 2);
    }

    #[tokio::test]
    async fn test_price_update_is_not_applied_when_backend_fails() {
        let (store, _dir) = offline_store().await;
        let result = store
            .update(&ProductId::new(2), json!({"price": 1}))
            .await;

        assert!(result.is_none());
        assert_eq!(
            store.get_by_id(&ProductId::new(2)).unwrap().price,
            Decimal::from(450_000)
        );
    }

    #[tokio::test]
    async fn test_update_applies_server_copy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"id": 1, "name": "Shop", "price": 100}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/products/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"id": 1, "name": "Shop", "price": 120, "inStock": false}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = parts_for(&server.uri(), dir.path()).await;
        let store = ProductStore::new(api, storage);

        let updated = store
            .update(&ProductId::new(1), json!({"price": 120}))
            .await
            .unwrap();
        assert_eq!(updated.price, Decimal::from(120));
        assert!(!updated.in_stock);
        assert!(store.error().is_none());
    }
}
