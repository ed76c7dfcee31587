//! Durable local key-value layer.
//!
//! Values are JSON documents stored one file per key under a directory.
//! Every handle forked from the same [`LocalStorage`] shares a change
//! channel: a write through one handle notifies the others, which is how
//! stores opened side by side (e.g. two windows) keep each other fresh.
//!
//! Each write goes to its own temp file and is renamed over the key's file,
//! so concurrent writers never see a torn document. Between writers the last
//! rename wins; callers that need ordering serialize their own writes.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Fixed keys used by the storefront.
pub mod keys {
    /// Session bearer token.
    pub const AUTH_TOKEN: &str = "auth_token";
    /// Testimonial collection.
    pub const TESTIMONIALS: &str = "testimonials";
    /// Blog post collection.
    pub const BLOG_POSTS: &str = "blog_posts";
    /// Settings singleton.
    pub const SETTINGS: &str = "site_settings";
}

const EVENT_CAPACITY: usize = 64;

/// Errors from the durable layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage I/O error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Value could not be serialized.
    #[error("failed to serialize {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Key contains characters that are not allowed in a file name.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Change notification for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Key that changed.
    pub key: String,
    /// Handle that performed the write.
    pub origin: u64,
}

/// Handle to the durable layer.
///
/// Cloning keeps the same origin; use [`LocalStorage::fork`] to get a handle
/// whose writes are seen as coming from somewhere else.
#[derive(Clone)]
pub struct LocalStorage {
    inner: Arc<LocalStorageInner>,
    origin: u64,
}

struct LocalStorageInner {
    dir: PathBuf,
    events: broadcast::Sender<StorageEvent>,
    next_origin: AtomicU64,
    next_write: AtomicU64,
}

impl std::fmt::Debug for LocalStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStorage")
            .field("dir", &self.inner.dir)
            .field("origin", &self.origin)
            .finish()
    }
}

impl LocalStorage {
    /// Open (creating if needed) the storage directory.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StorageError::Io {
                key: dir.display().to_string(),
                source,
            })?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            inner: Arc::new(LocalStorageInner {
                dir,
                events,
                next_origin: AtomicU64::new(1),
                next_write: AtomicU64::new(0),
            }),
            origin: 0,
        })
    }

    /// A new handle on the same storage with its own origin.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            origin: self.inner.next_origin.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Origin id stamped on this handle's change events.
    #[must_use]
    pub const fn origin(&self) -> u64 {
        self.origin
    }

    /// Directory backing this storage.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    /// Subscribe to change events from every handle.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.events.subscribe()
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.inner.dir.join(format!("{key}.json")))
    }

    /// Raw stored text for `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on invalid keys or I/O failures other than a
    /// missing file.
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_owned(),
                source,
            }),
        }
    }

    /// Decode the value stored under `key`.
    ///
    /// Missing keys, unreadable files and malformed JSON all yield `None`;
    /// the latter two are logged.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.get_raw(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "Failed to read local storage");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Ignoring malformed local storage value");
                None
            }
        }
    }

    /// Store `value` under `key` and notify other handles.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the write fails.
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let text = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
            key: key.to_owned(),
            source,
        })?;
        self.set_raw(key, &text).await
    }

    /// Store raw text under `key` and notify other handles.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn set_raw(&self, key: &str, text: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let seq = self.inner.next_write.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("json.{}.{seq}.tmp", self.origin));
        let io_err = |source| StorageError::Io {
            key: key.to_owned(),
            source,
        };

        tokio::fs::write(&tmp, text).await.map_err(io_err)?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(e));
        }

        debug!(key, origin = self.origin, bytes = text.len(), "Local storage write");
        self.notify(key);
        Ok(())
    }

    /// Delete `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the file exists but cannot be removed.
    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                self.notify(key);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_owned(),
                source,
            }),
        }
    }

    fn notify(&self, key: &str) {
        // No receivers is fine: nobody is listening yet.
        let _ = self.inner.events.send(StorageEvent {
            key: key.to_owned(),
            origin: self.origin,
        });
    }
}
