//! Session token handling.
//!
//! The backend issues an opaque bearer token on login. It is kept in durable
//! storage under [`keys::AUTH_TOKEN`] and read by [`ApiClient`] on every
//! request. Logging out overwrites it with [`PLACEHOLDER_TOKEN`], which the
//! client never sends.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{ApiClient, ApiError, PLACEHOLDER_TOKEN};
use crate::storage::{LocalStorage, StorageError, keys};

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login request failed or was rejected.
    #[error("Login failed: {0}")]
    Api(#[from] ApiError),

    /// Backend accepted the login but returned no token.
    #[error("Login response did not include a token")]
    MissingToken,

    /// Token could not be stored.
    #[error("Failed to store session: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Successful login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    /// Account details, passed through as returned.
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}

/// Login and logout against the backend.
#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
    storage: LocalStorage,
}

impl AuthService {
    #[must_use]
    pub const fn new(api: ApiClient, storage: LocalStorage) -> Self {
        Self { api, storage }
    }

    /// Exchange credentials for a session token and store it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the request fails, no token comes back, or the
    /// token cannot be stored.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<LoginResponse, AuthError> {
        let request = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let response: LoginResponse = self.api.post("auth/login", &request).await?;
        let token = response
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        self.storage.set_json(keys::AUTH_TOKEN, token).await?;
        info!("Logged in");
        Ok(response)
    }

    /// End the session. The backend call is best effort; the stored token is
    /// always replaced with the placeholder.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the placeholder cannot be stored.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        if let Err(e) = self
            .api
            .send_ignoring_body(Method::POST, "auth/logout", None::<&()>)
            .await
        {
            warn!(error = %e, "Logout request failed, clearing session locally");
        }
        self.storage
            .set_json(keys::AUTH_TOKEN, PLACEHOLDER_TOKEN)
            .await?;
        Ok(())
    }

    /// Whether a real session token is stored.
    pub async fn is_authenticated(&self) -> bool {
        self.storage
            .get_json::<String>(keys::AUTH_TOKEN)
            .await
            .is_some_and(|t| !t.is_empty() && t != PLACEHOLDER_TOKEN)
    }

    /// Store `token` unless a token (or the placeholder) is already stored.
    ///
    /// Returns whether the token was written.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the write fails.
    pub async fn seed_token(&self, token: &SecretString) -> Result<bool, AuthError> {
        if self
            .storage
            .get_json::<String>(keys::AUTH_TOKEN)
            .await
            .is_some()
        {
            return Ok(false);
        }
        self.storage
            .set_json(keys::AUTH_TOKEN, token.expose_secret())
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::test_support::{offline_parts, parts_for};

    fn password() -> SecretString {
        SecretString::from("hunter2")
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"email": "admin@templateshop.vn", "password": "hunter2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"token": "abc123", "user": {"id": 4}}
            })))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = parts_for(&server.uri(), dir.path()).await;
        let auth = AuthService::new(api, storage.clone());

        let response = auth.login("admin@templateshop.vn", &password()).await.unwrap();
        assert!(response.user.is_some());
        assert!(auth.is_authenticated().await);
        let stored: Option<String> = storage.get_json(keys::AUTH_TOKEN).await;
        assert_eq!(stored.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_rejected_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "Sai mật khẩu"
            })))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = parts_for(&server.uri(), dir.path()).await;
        let auth = AuthService::new(api, storage);

        let err = auth.login("a@b.c", &password()).await.unwrap_err();
        assert!(matches!(err, AuthError::Api(ApiError::Rejected(_))));
        assert!(!auth.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_login_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = parts_for(&server.uri(), dir.path()).await;
        let auth = AuthService::new(api, storage);

        let err = auth.login("a@b.c", &password()).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingToken));
    }

    #[tokio::test]
    async fn test_logout_stores_placeholder_even_offline() {
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = offline_parts(dir.path()).await;
        storage.set_json(keys::AUTH_TOKEN, "real").await.unwrap();
        let auth = AuthService::new(api, storage.clone());

        auth.logout().await.unwrap();
        let stored: Option<String> = storage.get_json(keys::AUTH_TOKEN).await;
        assert_eq!(stored.as_deref(), Some(PLACEHOLDER_TOKEN));
        assert!(!auth.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_seed_token_only_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let (api, storage) = offline_parts(dir.path()).await;
        let auth = AuthService::new(api, storage);

        assert!(auth.seed_token(&SecretString::from("from-env")).await.unwrap());
        assert!(!auth.seed_token(&SecretString::from("other")).await.unwrap());
        assert!(auth.is_authenticated().await);
    }
}
