//! Generic synchronized entity store.
//!
//! A [`SyncStore`] owns the in-memory copy of one entity collection and
//! reconciles it with the backend:
//!
//! - `load` replaces the collection from the backend, or falls back to the
//!   durable copy, the bundled dataset, or nothing
//! - mutations call the backend first and, on failure, consult the entity's
//!   [`SyncPolicy`] to decide whether to apply locally
//! - reads are local only
//!
//! Failures never surface as `Err`; they are recorded as a string error the
//! caller may display.

pub mod patch;
mod policy;

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Mutex, OnceCell};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, ApiError};
use crate::storage::LocalStorage;

pub use patch::{PatchError, merge_shallow};
pub use policy::{MutationPolicy, SyncPolicy};

/// Per-entity configuration of the sync engine.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Identity type used for lookups and endpoint paths.
    type Id: Clone + PartialEq + fmt::Display + fmt::Debug + Send + Sync;

    /// Human-readable name used in error messages.
    const NAME: &'static str;

    /// Collection endpoint relative to the API base URL.
    const ENDPOINT: &'static str;

    /// Failure policy per mutation kind.
    const POLICY: SyncPolicy;

    /// Durable storage key, for collections that survive restarts.
    const PERSIST_KEY: Option<&'static str> = None;

    /// Identity of this entity.
    fn id(&self) -> Self::Id;

    /// Give an entity created while offline a locally unique identity.
    fn assign_local_id(&mut self, now_millis: i64);

    /// Fill in derived fields before the entity is sent for creation.
    fn prepare_for_create(&mut self) {}

    /// Dataset substituted when the initial load fails.
    #[must_use]
    fn bundled() -> Vec<Self> {
        Vec::new()
    }
}

/// Where the current collection came from after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Fresh from the backend.
    Remote,
    /// Durable local copy.
    Persisted,
    /// Bundled fallback dataset.
    Bundled,
    /// Nothing available; collection is empty.
    Empty,
    /// No fetch was attempted; whatever was held in memory is kept.
    Skipped,
}

struct StoreState<E> {
    items: Vec<E>,
    error: Option<String>,
}

struct SyncStoreInner<E> {
    api: ApiClient,
    storage: LocalStorage,
    state: RwLock<StoreState<E>>,
    loaded: OnceCell<()>,
    /// Held from snapshot to rename so the newest state is the last written.
    persist_lock: Mutex<()>,
}

/// Handle to one synchronized collection.
///
/// Cloning is cheap and every clone sees the same state.
pub struct SyncStore<E> {
    inner: Arc<SyncStoreInner<E>>,
}

impl<E> Clone for SyncStore<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Entity> fmt::Debug for SyncStore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("SyncStore")
            .field("entity", &E::NAME)
            .field("items", &state.items.len())
            .field("error", &state.error)
            .finish()
    }
}

impl<E: Entity> SyncStore<E> {
    /// Create an empty, not yet loaded store.
    #[must_use]
    pub fn new(api: ApiClient, storage: LocalStorage) -> Self {
        Self {
            inner: Arc::new(SyncStoreInner {
                api,
                storage,
                state: RwLock::new(StoreState {
                    items: Vec::new(),
                    error: None,
                }),
                loaded: OnceCell::new(),
                persist_lock: Mutex::new(()),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState<E>> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState<E>> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// API client shared with the store.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Storage handle shared with the store.
    #[must_use]
    pub fn storage(&self) -> &LocalStorage {
        &self.inner.storage
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load once per store lifetime. Later calls return immediately.
    pub async fn ensure_loaded(&self) {
        self.inner
            .loaded
            .get_or_init(|| async {
                self.load().await;
            })
            .await;
    }

    /// Whether a load has completed.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.inner.loaded.initialized()
    }

    /// Fetch the whole collection from the backend, falling back locally.
    #[instrument(skip(self), fields(entity = E::NAME))]
    pub async fn load(&self) -> LoadSource {
        let source = match self.inner.api.get::<Vec<E>>(E::ENDPOINT).await {
            Ok(items) => {
                info!(count = items.len(), "Loaded from backend");
                {
                    let mut state = self.write();
                    state.items = items;
                    state.error = None;
                }
                self.persist().await;
                LoadSource::Remote
            }
            Err(err) => {
                let (items, source) = self.fallback_items().await;
                warn!(error = %err, source = ?source, count = items.len(), "Backend unavailable, using fallback");
                let mut state = self.write();
                state.items = items;
                state.error = Some(format!("Failed to load {}s: {err}", E::NAME));
                source
            }
        };

        // Only fails when already set or being set by ensure_loaded.
        let _ = self.inner.loaded.set(());
        source
    }

    /// Alias for [`SyncStore::load`].
    pub async fn refresh(&self) -> LoadSource {
        self.load().await
    }

    async fn fallback_items(&self) -> (Vec<E>, LoadSource) {
        if let Some(key) = E::PERSIST_KEY
            && let Some(items) = self.inner.storage.get_json::<Vec<E>>(key).await
        {
            return (items, LoadSource::Persisted);
        }

        let bundled = E::bundled();
        if bundled.is_empty() {
            (bundled, LoadSource::Empty)
        } else {
            (bundled, LoadSource::Bundled)
        }
    }

    // =========================================================================
    // Local reads
    // =========================================================================

    /// Snapshot of the collection.
    #[must_use]
    pub fn items(&self) -> Vec<E> {
        self.read().items.clone()
    }

    /// Entities matching `predicate`, in collection order.
    #[must_use]
    pub fn filter(&self, mut predicate: impl FnMut(&E) -> bool) -> Vec<E> {
        self.read()
            .items
            .iter()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }

    /// Run `f` over the current collection without cloning it.
    pub fn with_items<R>(&self, f: impl FnOnce(&[E]) -> R) -> R {
        f(&self.read().items)
    }

    /// Number of entities held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().items.is_empty()
    }

    /// Local lookup by identity.
    #[must_use]
    pub fn get_by_id(&self, id: &E::Id) -> Option<E> {
        self.read().items.iter().find(|item| item.id() == *id).cloned()
    }

    /// Last recorded error, if any.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    /// Clear the recorded error.
    pub fn clear_error(&self) {
        self.write().error = None;
    }

    pub(crate) fn set_error(&self, message: String) {
        self.write().error = Some(message);
    }

    /// Mutate the collection under one write guard.
    pub(crate) fn mutate_local<R>(&self, f: impl FnOnce(&mut Vec<E>) -> R) -> R {
        f(&mut self.write().items)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create an entity remotely, appending it locally.
    ///
    /// Returns the stored entity, or `None` if nothing was stored.
    #[instrument(skip(self, entity), fields(entity = E::NAME))]
    pub async fn create(&self, mut entity: E) -> Option<E> {
        self.ensure_loaded().await;
        entity.prepare_for_create();

        let stored = match self.inner.api.post::<_, Value>(E::ENDPOINT, &entity).await {
            Ok(payload) => {
                let stored = merge_shallow(&entity, &payload).unwrap_or_else(|e| {
                    debug!(error = %e, "Create response is not an entity, keeping input");
                    with_local_id(entity)
                });
                self.clear_error();
                stored
            }
            Err(err) => {
                self.record_failure("create", &err);
                if !E::POLICY.create.applies_locally_on_failure() {
                    return None;
                }
                with_local_id(entity)
            }
        };

        self.write().items.push(stored.clone());
        self.persist().await;
        Some(stored)
    }

    /// Update an entity with a partial JSON object.
    ///
    /// On success the backend's returned object (or the request patch when
    /// the backend returns no object) is shallow-merged into the local copy.
    /// Returns the updated entity, or `None` if nothing changed locally.
    #[instrument(skip(self, patch), fields(entity = E::NAME, id = %id))]
    pub async fn update(&self, id: &E::Id, patch: Value) -> Option<E> {
        self.ensure_loaded().await;

        let path = format!("{}/{id}", E::ENDPOINT);
        let effective = match self.inner.api.put::<_, Value>(&path, &patch).await {
            Ok(payload) => {
                self.clear_error();
                if payload.is_object() { payload } else { patch }
            }
            Err(err) => {
                self.record_failure("update", &err);
                if !E::POLICY.update.applies_locally_on_failure() {
                    return None;
                }
                patch
            }
        };

        let updated = self.apply_patch(id, &effective);
        if updated.is_some() {
            self.persist().await;
        }
        updated
    }

    fn apply_patch(&self, id: &E::Id, patch: &Value) -> Option<E> {
        let mut state = self.write();
        let Some(slot) = state.items.iter_mut().find(|item| item.id() == *id) else {
            debug!("Entity not held locally, nothing to patch");
            return None;
        };

        match merge_shallow(slot, patch) {
            Ok(merged) => {
                *slot = merged.clone();
                Some(merged)
            }
            Err(e) => {
                state.error = Some(format!("Failed to apply {} update: {e}", E::NAME));
                None
            }
        }
    }

    /// Delete an entity remotely and locally.
    ///
    /// Returns whether the entity was held locally.
    #[instrument(skip(self), fields(entity = E::NAME, id = %id))]
    pub async fn remove(&self, id: &E::Id) -> bool {
        self.ensure_loaded().await;

        let path = format!("{}/{id}", E::ENDPOINT);
        match self.inner.api.delete(&path).await {
            Ok(()) => self.clear_error(),
            Err(err) => {
                self.record_failure("delete", &err);
                if !E::POLICY.remove.applies_locally_on_failure() {
                    return false;
                }
            }
        }

        let removed = {
            let mut state = self.write();
            let before = state.items.len();
            state.items.retain(|item| item.id() != *id);
            state.items.len() != before
        };
        if removed {
            self.persist().await;
        }
        removed
    }

    fn record_failure(&self, action: &str, err: &ApiError) {
        warn!(entity = E::NAME, action, error = %err, "Backend call failed");
        self.set_error(format!("Failed to {action} {}: {err}", E::NAME));
    }

    // =========================================================================
    // Durable copy
    // =========================================================================

    /// Write the collection to durable storage, if this entity persists.
    pub async fn persist(&self) {
        let Some(key) = E::PERSIST_KEY else {
            return;
        };
        let _guard = self.inner.persist_lock.lock().await;
        let items = self.items();
        if let Err(e) = self.inner.storage.set_json(key, &items).await {
            warn!(entity = E::NAME, error = %e, "Failed to persist collection");
            self.set_error(format!("Failed to save {}s locally: {e}", E::NAME));
        }
    }

    /// Replace the collection with the durable copy, if one exists.
    ///
    /// Returns whether anything was loaded.
    pub async fn rehydrate(&self) -> bool {
        let Some(key) = E::PERSIST_KEY else {
            return false;
        };
        match self.inner.storage.get_json::<Vec<E>>(key).await {
            Some(items) => {
                debug!(entity = E::NAME, count = items.len(), "Rehydrated from local storage");
                self.write().items = items;
                true
            }
            None => false,
        }
    }

    /// Follow writes to this entity's storage key made by other handles.
    ///
    /// Returns `None` for entities that do not persist. The task ends when
    /// the store is dropped or the storage channel closes.
    #[must_use]
    pub fn spawn_storage_listener(&self) -> Option<JoinHandle<()>> {
        let key = E::PERSIST_KEY?;
        let mut events = self.inner.storage.subscribe();
        let own_origin = self.inner.storage.origin();
        let weak: Weak<SyncStoreInner<E>> = Arc::downgrade(&self.inner);

        Some(tokio::spawn(async move {
            loop {
                let refresh = match events.recv().await {
                    Ok(event) => event.key == key && event.origin != own_origin,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Storage listener lagged, rehydrating");
                        true
                    }
                    Err(RecvError::Closed) => break,
                };
                if !refresh {
                    continue;
                }
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                SyncStore { inner }.rehydrate().await;
            }
        }))
    }
}

static LAST_LOCAL_ID: AtomicI64 = AtomicI64::new(0);

/// Millisecond timestamp, bumped so that no two calls return the same value.
fn next_local_millis() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_LOCAL_ID.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_LOCAL_ID.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(seen) => last = seen,
        }
    }
}

fn with_local_id<E: Entity>(mut entity: E) -> E {
    entity.assign_local_id(next_local_millis());
    entity
}
