//! Site settings singleton store.
//!
//! Unlike the collection stores, settings are one document. It is fetched
//! from `GET settings`, written back whole with `PUT settings`, and mirrored
//! to durable storage on every change so the admin's edits survive a restart
//! even when the backend is down.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rust_decimal::Decimal;
use serde_json::Value;
use template_shop_core::{SettingsError, SettingsSection, SiteSettings};
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, instrument, warn};

use crate::api::ApiClient;
use crate::storage::{LocalStorage, StorageError, keys};
use crate::sync::LoadSource;

const ENDPOINT: &str = "settings";

/// Errors from a local settings edit.
#[derive(Debug, Error)]
pub enum SettingsStoreError {
    /// Section, field or value failed validation.
    #[error(transparent)]
    Invalid(#[from] SettingsError),

    /// Change was applied in memory but could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

struct SettingsState {
    settings: SiteSettings,
    error: Option<String>,
}

struct SettingsStoreInner {
    api: ApiClient,
    storage: LocalStorage,
    state: RwLock<SettingsState>,
    loaded: OnceCell<()>,
    persist_lock: Mutex<()>,
}

/// Handle to the settings singleton. Cheap to clone.
#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<SettingsStoreInner>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("error", &self.read().error)
            .finish_non_exhaustive()
    }
}

impl SettingsStore {
    /// Create a store holding the defaults.
    #[must_use]
    pub fn new(api: ApiClient, storage: LocalStorage) -> Self {
        Self {
            inner: Arc::new(SettingsStoreInner {
                api,
                storage,
                state: RwLock::new(SettingsState {
                    settings: SiteSettings::default(),
                    error: None,
                }),
                loaded: OnceCell::new(),
                persist_lock: Mutex::new(()),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SettingsState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SettingsState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load once per store lifetime.
    pub async fn ensure_loaded(&self) {
        self.inner
            .loaded
            .get_or_init(|| async {
                self.load().await;
            })
            .await;
    }

    /// Fetch settings from the backend, merged over the defaults.
    ///
    /// On failure the durable copy is used, else the defaults.
    #[instrument(skip(self))]
    pub async fn load(&self) -> LoadSource {
        let source = match self.inner.api.get::<SiteSettings>(ENDPOINT).await {
            Ok(settings) => {
                info!("Loaded settings from backend");
                {
                    let mut state = self.write();
                    state.settings = settings;
                    state.error = None;
                }
                if let Err(e) = self.persist().await {
                    warn!(error = %e, "Failed to mirror settings locally");
                }
                LoadSource::Remote
            }
            Err(err) => {
                let persisted = self
                    .inner
                    .storage
                    .get_json::<SiteSettings>(keys::SETTINGS)
                    .await;
                warn!(error = %err, persisted = persisted.is_some(), "Backend unavailable, using local settings");

                let source = if persisted.is_some() {
                    LoadSource::Persisted
                } else {
                    LoadSource::Bundled
                };
                let mut state = self.write();
                state.settings = persisted.unwrap_or_default();
                state.error = Some(format!("Failed to load settings: {err}"));
                source
            }
        };

        let _ = self.inner.loaded.set(());
        source
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot of the whole document.
    #[must_use]
    pub fn get(&self) -> SiteSettings {
        self.read().settings.clone()
    }

    /// One section as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if serialization fails.
    pub fn section(&self, section: SettingsSection) -> Result<Value, SettingsError> {
        self.read().settings.section_value(section)
    }

    /// Shipping fee charged for an order `subtotal`.
    #[must_use]
    pub fn shipping_fee_for(&self, subtotal: Decimal) -> Decimal {
        self.read().settings.payments.shipping_fee_for(subtotal)
    }

    /// Last recorded error.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    /// Clear the recorded error.
    pub fn clear_error(&self) {
        self.write().error = None;
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Change one field and persist locally. Nothing is sent until
    /// [`SettingsStore::save`].
    ///
    /// # Errors
    ///
    /// Returns `SettingsStoreError::Invalid` (leaving settings unchanged) for
    /// an unknown field or ill-typed value, and `SettingsStoreError::Storage`
    /// if the durable write fails.
    #[instrument(skip_all, fields(section = %section, field = field))]
    pub async fn update(
        &self,
        section: SettingsSection,
        field: &str,
        value: Value,
    ) -> Result<SiteSettings, SettingsStoreError> {
        self.ensure_loaded().await;
        let updated = {
            let mut state = self.write();
            state.settings.set_field(section, field, value)?;
            state.settings.clone()
        };
        self.persist().await?;
        Ok(updated)
    }

    /// Push the whole document to the backend. Returns whether it was
    /// accepted.
    #[instrument(skip(self))]
    pub async fn save(&self) -> bool {
        self.ensure_loaded().await;
        let settings = self.get();
        self.put_remote(&settings).await
    }

    /// Revert to the defaults, remotely and locally.
    ///
    /// Local state is reset even when the backend call fails. Returns whether
    /// the backend accepted the reset.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> bool {
        let defaults = SiteSettings::default();
        self.write().settings = defaults.clone();
        if let Err(e) = self.persist().await {
            warn!(error = %e, "Failed to persist default settings");
            self.write().error = Some(format!("Failed to save settings locally: {e}"));
        }
        self.put_remote(&defaults).await
    }

    async fn put_remote(&self, settings: &SiteSettings) -> bool {
        match self
            .inner
            .api
            .send_ignoring_body(reqwest::Method::PUT, ENDPOINT, Some(settings))
            .await
        {
            Ok(()) => {
                self.clear_error();
                true
            }
            Err(err) => {
                warn!(error = %err, "Failed to save settings to backend");
                self.write().error = Some(format!("Failed to save settings: {err}"));
                false
            }
        }
    }

    async fn persist(&self) -> Result<(), StorageError> {
        // Snapshot under the lock so writes land in edit order.
        let _guard = self.inner.persist_lock.lock().await;
        let settings = self.get();
        self.inner
            .storage
            .set_json(keys::SETTINGS, &settings)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::test_support::{offline_parts, parts_for};

    #[tokio::test]
    async fn test_load_merges_partial_document_over_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/settings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"general": {"siteName": "Shop VN"}, "payments": {"shippingFee": 25000}}
            })))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = parts_for(&server.uri(), dir.path()).await;
        let store = SettingsStore::new(api, storage);

        assert_eq!(store.load().await, LoadSource::Remote);
        let settings = store.get();
        assert_eq!(settings.general.site_name, "Shop VN");
        assert_eq!(settings.payments.shipping_fee, Decimal::from(25_000));
        assert_eq!(
            settings.payments.free_shipping_threshold,
            SiteSettings::default().payments.free_shipping_threshold
        );
    }

    #[tokio::test]
    async fn test_offline_load_uses_defaults_then_local_copy() {
        let dir = tempfile::tempdir().unwrap();
        {
            let (api, storage) = offline_parts(dir.path()).await;
            let store = SettingsStore::new(api, storage);
            assert_eq!(store.load().await, LoadSource::Bundled);
            assert_eq!(store.get(), SiteSettings::default());
            store
                .update(SettingsSection::General, "siteName", json!("Offline Shop"))
                .await
                .unwrap();
        }

        let (api, storage) = offline_parts(dir.path()).await;
        let store = SettingsStore::new(api, storage);
        assert_eq!(store.load().await, LoadSource::Persisted);
        assert_eq!(store.get().general.site_name, "Offline Shop");
    }

    #[tokio::test]
    async fn test_invalid_update_leaves_settings_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = offline_parts(dir.path()).await;
        let store = SettingsStore::new(api, storage);

        let err = store
            .update(SettingsSection::Payments, "shippingFee", json!("free"))
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsStoreError::Invalid(SettingsError::InvalidValue { .. })));
        let err = store
            .update(SettingsSection::Payments, "colour", json!(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsStoreError::Invalid(SettingsError::UnknownField { .. })));
        assert_eq!(store.get(), SiteSettings::default());
    }

    #[tokio::test]
    async fn test_shipping_fee_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = offline_parts(dir.path()).await;
        let store = SettingsStore::new(api, storage);
        store
            .update(SettingsSection::Payments, "freeShippingThreshold", json!(1_000_000))
            .await
            .unwrap();
        store
            .update(SettingsSection::Payments, "shippingFee", json!(50_000))
            .await
            .unwrap();

        assert_eq!(store.shipping_fee_for(Decimal::from(1_000_000)), Decimal::ZERO);
        assert_eq!(store.shipping_fee_for(Decimal::from(999_999)), Decimal::from(50_000));
    }

    #[tokio::test]
    async fn test_reset_is_local_even_when_backend_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = offline_parts(dir.path()).await;
        let store = SettingsStore::new(api, storage);
        store
            .update(SettingsSection::Appearance, "darkMode", json!(true))
            .await
            .unwrap();

        assert!(!store.reset().await);
        assert_eq!(store.get(), SiteSettings::default());
        assert!(store.error().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_updates_all_reach_local_copy() {
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = offline_parts(dir.path()).await;
        let store = SettingsStore::new(api, storage);
        store.ensure_loaded().await;

        let fields = [
            (SettingsSection::General, "siteName", json!("Concurrent Shop")),
            (SettingsSection::General, "siteDescription", json!("Mẫu giao diện")),
            (SettingsSection::Payments, "shippingFee", json!(35_000)),
            (SettingsSection::Payments, "freeShippingThreshold", json!(800_000)),
            (SettingsSection::Appearance, "darkMode", json!(true)),
        ];
        let updates: Vec<_> = fields
            .into_iter()
            .map(|(section, field, value)| {
                let store = store.clone();
                tokio::spawn(async move { store.update(section, field, value).await })
            })
            .collect();
        for update in updates {
            update.await.unwrap().unwrap();
        }

        let (api, storage) = offline_parts(dir.path()).await;
        let reopened = SettingsStore::new(api, storage);
        assert_eq!(reopened.load().await, LoadSource::Persisted);
        assert_eq!(reopened.get(), store.get());
        assert_eq!(reopened.get().payments.shipping_fee, Decimal::from(35_000));
        assert!(reopened.get().appearance.dark_mode);
    }

    #[tokio::test]
    async fn test_save_puts_whole_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/settings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/settings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = parts_for(&server.uri(), dir.path()).await;
        let store = SettingsStore::new(api, storage);

        assert!(store.save().await);
        assert!(store.error().is_none());
    }
}
