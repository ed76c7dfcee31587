//! REST client for the Template Shop backend.
//!
//! # Architecture
//!
//! - Thin JSON client over `reqwest`; the backend is a set of PHP CRUD
//!   controllers reached under one base URL
//! - Responses are decoded through [`envelope`], which accepts a wrapped
//!   `{ data }` object or a bare payload
//! - An `Authorization: Bearer` header is attached when local storage holds a
//!   real session token (the placeholder token is never sent)
//! - No retries. A timeout applies only when configured.

pub mod envelope;

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ApiConfig;
use crate::storage::{LocalStorage, keys};

pub use envelope::Envelope;

/// Token value written after logout; never sent to the backend.
pub const PLACEHOLDER_TOKEN: &str = "demo-token";

/// Maximum number of body characters kept in error messages and logs.
const BODY_PREVIEW_CHARS: usize = 200;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: connection refused, DNS, timeout, TLS.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Backend answered `success: false`.
    #[error("Rejected by server: {0}")]
    Rejected(String),

    /// Body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// Endpoint could not be joined onto the base URL.
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the failure happened before the backend produced an answer.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Client for the Template Shop REST API.
///
/// Cheaply cloneable; all clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    storage: LocalStorage,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client. The token is read from `storage` on every request.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig, storage: LocalStorage) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client: builder.build()?,
                base_url: config.base_url.clone(),
                storage,
            }),
        })
    }

    /// Base URL endpoints are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Local storage the client reads its token from.
    #[must_use]
    pub fn storage(&self) -> &LocalStorage {
        &self.inner.storage
    }

    /// Stored session token, unless absent or the placeholder.
    async fn bearer_token(&self) -> Option<String> {
        self.inner
            .storage
            .get_json::<String>(keys::AUTH_TOKEN)
            .await
            .filter(|token| !token.is_empty() && token != PLACEHOLDER_TOKEN)
    }

    /// GET `path` and decode the payload.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-success status, or a
    /// payload that does not decode into `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let text = self.send(Method::GET, path, None::<&()>).await?;
        envelope::decode(&text)
    }

    /// POST a JSON body to `path` and decode the payload.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.send(Method::POST, path, Some(body)).await?;
        envelope::decode(&text)
    }

    /// PUT a JSON body to `path` and decode the payload.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.send(Method::PUT, path, Some(body)).await?;
        envelope::decode(&text)
    }

    /// Send a request whose response body is not needed.
    ///
    /// An empty or non-JSON body is accepted; a JSON wrapper reporting
    /// `success: false` is still an error.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, non-success status, or an
    /// explicit rejection.
    pub async fn send_ignoring_body<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let text = self.send(method, path, body).await?;
        match Envelope::parse(&text) {
            Err(ApiError::Rejected(message)) => Err(ApiError::Rejected(message)),
            _ => Ok(()),
        }
    }

    /// DELETE `path`, ignoring the response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send_ignoring_body`].
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send_ignoring_body(Method::DELETE, path, None::<&()>)
            .await
    }

    #[instrument(skip_all, fields(method = %method, path = %path))]
    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<String, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.inner.base_url.join(path.trim_start_matches('/'))?;

        let mut request = self
            .inner
            .client
            .request(method, url)
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = self.bearer_token().await {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let preview: String = text.chars().take(BODY_PREVIEW_CHARS).collect();
            tracing::error!(status = %status, body = %preview, "Backend returned non-success status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: preview,
            });
        }

        debug!(status = %status, bytes = text.len(), "Backend response");
        Ok(text)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn client_for(server: &MockServer) -> (ApiClient, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path()).await.unwrap();
        let config = ApiConfig::for_base_url(&server.uri()).unwrap();
        (ApiClient::new(&config, storage).unwrap(), dir)
    }

    #[tokio::test]
    async fn test_get_decodes_wrapped_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": true, "data": [1, 2, 3]})),
            )
            .mount(&server)
            .await;

        let (client, _dir) = client_for(&server).await;
        let items: Vec<i32> = client.get("/products").await.unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let (client, _dir) = client_for(&server).await;
        let err = client.get::<Vec<i32>>("orders").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_bearer_token_is_attached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(header("Authorization", "Bearer real-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _dir) = client_for(&server).await;
        client
            .storage()
            .set_json(keys::AUTH_TOKEN, "real-token")
            .await
            .unwrap();
        let users: Vec<i32> = client.get("users").await.unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_placeholder_token_is_not_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists("Authorization"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let (client, _dir) = client_for(&server).await;
        client
            .storage()
            .set_json(keys::AUTH_TOKEN, PLACEHOLDER_TOKEN)
            .await
            .unwrap();
        let items: Vec<i32> = client.get("blog").await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/cart/5"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let (client, _dir) = client_for(&server).await;
        client.delete("cart/5").await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path()).await.unwrap();
        let config = ApiConfig::for_base_url("http://127.0.0.1:1/api").unwrap();
        let client = ApiClient::new(&config, storage).unwrap();

        let err = client.get::<Vec<i32>>("products").await.unwrap_err();
        assert!(err.is_transport());
    }
}
