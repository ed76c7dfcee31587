//! Shared fixtures for unit tests.

#![allow(clippy::unwrap_used)]

use std::path::Path;

use crate::api::ApiClient;
use crate::config::ApiConfig;
use crate::storage::LocalStorage;

/// Base URL nothing listens on; every request fails at connect time.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1/api";

/// Client and storage pointed at `base_url`, storing under `dir`.
pub async fn parts_for(base_url: &str, dir: &Path) -> (ApiClient, LocalStorage) {
    let storage = LocalStorage::open(dir).await.unwrap();
    let api = ApiClient::new(&ApiConfig::for_base_url(base_url).unwrap(), storage.clone()).unwrap();
    (api, storage)
}

/// Client and storage for a backend that cannot be reached.
pub async fn offline_parts(dir: &Path) -> (ApiClient, LocalStorage) {
    parts_for(UNREACHABLE_URL, dir).await
}
