//! Application state: every store, built once and passed around.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::auth::AuthService;
use crate::config::ShopConfig;
use crate::content::ContentPolicy;
use crate::dashboard::DashboardStats;
use crate::error::Result;
use crate::storage::LocalStorage;
use crate::stores::{
    BlogStore, CartStore, OrderStore, ProductStore, SettingsStore, TestimonialStore, UserStore,
};

/// Application state shared by every consumer.
///
/// This struct is cheaply cloneable via `Arc`. Each instance owns its own
/// stores; two instances opened on the same storage behave like two browser
/// windows (persisted collections follow each other, the rest do not).
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ShopConfig,
    storage: LocalStorage,
    api: ApiClient,
    auth: AuthService,
    products: ProductStore,
    orders: OrderStore,
    users: UserStore,
    cart: CartStore,
    testimonials: TestimonialStore,
    blog: BlogStore,
    settings: SettingsStore,
    listeners: Vec<JoinHandle<()>>,
}

impl Drop for AppStateInner {
    fn drop(&mut self) {
        for listener in &self.listeners {
            listener.abort();
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("storage", &self.inner.storage)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Open storage from `config` and assemble every store.
    ///
    /// Must be called from within a tokio runtime; storage listeners are
    /// spawned here.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directory cannot be opened, the HTTP
    /// client cannot be built, or the configured token cannot be stored.
    pub async fn new(config: ShopConfig) -> Result<Self> {
        let storage = LocalStorage::open(&config.storage_dir).await?;
        Self::with_storage(config, storage).await
    }

    /// Assemble every store over an existing storage handle.
    ///
    /// Pass [`LocalStorage::fork`] of another instance's storage to get a
    /// second, independent instance that sees its persisted writes.
    ///
    /// # Errors
    ///
    /// See [`AppState::new`].
    pub async fn with_storage(config: ShopConfig, storage: LocalStorage) -> Result<Self> {
        let api = ApiClient::new(&config.api, storage.clone())?;
        let auth = AuthService::new(api.clone(), storage.clone());
        if let Some(token) = &config.api.token
            && auth.seed_token(token).await?
        {
            debug!("Seeded session token from configuration");
        }

        let testimonials = TestimonialStore::new(api.clone(), storage.clone());
        let blog = BlogStore::new(api.clone(), storage.clone());
        let listeners = [
            testimonials.spawn_storage_listener(),
            blog.spawn_storage_listener(),
        ]
        .into_iter()
        .flatten()
        .collect();

        info!(
            base_url = %config.api.base_url,
            storage = %storage.dir().display(),
            "Storefront state ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                products: ProductStore::new(api.clone(), storage.clone()),
                orders: OrderStore::new(api.clone(), storage.clone()),
                users: UserStore::new(api.clone(), storage.clone()),
                cart: CartStore::new(api.clone(), storage.clone()),
                settings: SettingsStore::new(api.clone(), storage.clone()),
                testimonials,
                blog,
                listeners,
                auth,
                api,
                storage,
                config,
            }),
        })
    }

    /// Load every store that has not been loaded yet, concurrently.
    pub async fn load_all(&self) {
        tokio::join!(
            self.inner.products.ensure_loaded(),
            self.inner.orders.ensure_loaded(),
            self.inner.users.ensure_loaded(),
            self.inner.cart.ensure_loaded(),
            self.inner.testimonials.ensure_loaded(),
            self.inner.blog.ensure_loaded(),
            self.inner.settings.ensure_loaded(),
        );
    }

    /// Dashboard figures over the current product, order and user snapshots.
    #[must_use]
    pub fn dashboard(&self) -> DashboardStats {
        DashboardStats::compute(
            &self.inner.products.items(),
            &self.inner.orders.items(),
            &self.inner.users.items(),
        )
    }

    #[must_use]
    pub fn config(&self) -> &ShopConfig {
        &self.inner.config
    }

    /// How blog HTML is rendered.
    #[must_use]
    pub fn content_policy(&self) -> ContentPolicy {
        self.inner.config.content_policy
    }

    #[must_use]
    pub fn storage(&self) -> &LocalStorage {
        &self.inner.storage
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn products(&self) -> &ProductStore {
        &self.inner.products
    }

    #[must_use]
    pub fn orders(&self) -> &OrderStore {
        &self.inner.orders
    }

    #[must_use]
    pub fn users(&self) -> &UserStore {
        &self.inner.users
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn testimonials(&self) -> &TestimonialStore {
        &self.inner.testimonials
    }

    #[must_use]
    pub fn blog(&self) -> &BlogStore {
        &self.inner.blog
    }

    #[must_use]
    pub fn settings(&self) -> &SettingsStore {
        &self.inner.settings
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::test_support::UNREACHABLE_URL;

    fn offline_config(dir: &std::path::Path) -> ShopConfig {
        ShopConfig {
            api: ApiConfig::for_base_url(UNREACHABLE_URL).unwrap(),
            storage_dir: dir.to_path_buf(),
            content_policy: ContentPolicy::Sanitized,
        }
    }

    #[tokio::test]
    async fn test_load_all_falls_back_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(offline_config(dir.path())).await.unwrap();
        state.load_all().await;

        assert_eq!(state.products().len(), 6);
        assert_eq!(state.orders().len(), 4);
        assert!(state.cart().is_empty());
        assert!(state.cart().is_offline());
        assert_eq!(state.blog().len(), 3);
        assert_eq!(state.dashboard().total_orders, 4);
        assert_eq!(state.content_policy(), ContentPolicy::Sanitized);
    }

    #[tokio::test]
    async fn test_configured_token_is_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = offline_config(dir.path());
        config.api.token = Some(secrecy::SecretString::from("env-token"));

        let state = AppState::new(config).await.unwrap();
        assert!(state.auth().is_authenticated().await);
    }
}
