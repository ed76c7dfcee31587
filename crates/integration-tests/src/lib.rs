//! Integration tests for Template Shop.
//!
//! The tests drive [`AppState`] against [`FakeBackend`], an in-process axum
//! server that speaks the same REST shapes as the PHP controllers. Nothing
//! external is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p template-shop-integration-tests
//! ```
//!
//! # Fake backend
//!
//! ```text
//! GET    /api/{collection}        - { success, data: [...] }
//! POST   /api/{collection}        - create, ids assigned by the server
//! PUT    /api/{collection}/{id}   - shallow merge, returns the entity
//! DELETE /api/{collection}/{id}
//! GET    /api/cart                - cart lines
//! POST   /api/cart                - { productId, quantity } sets a line
//! PUT    /api/cart/{id}           - { quantity }
//! DELETE /api/cart/{id}, /api/cart
//! GET    /api/settings, PUT /api/settings
//! POST   /api/auth/login, /api/auth/logout
//! ```
//!
//! [`FakeBackend::set_offline`] makes every route answer 503, which the
//! client treats like an unreachable server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Path as UrlPath, Request, State};
use axum::http::{Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use template_shop_core::SiteSettings;
use template_shop_storefront::config::{ApiConfig, ShopConfig};
use template_shop_storefront::content::ContentPolicy;
use template_shop_storefront::fallback;
use template_shop_storefront::state::AppState;
use tokio::task::JoinHandle;

/// Base URL nothing listens on.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1/api";

/// Collections served by the generic routes.
const COLLECTIONS: [&str; 5] = ["products", "orders", "users", "testimonials", "blog"];

/// First id the server hands out for created entities.
const FIRST_SERVER_ID: i64 = 1000;

/// One request seen by the backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Clone)]
struct BackendState {
    inner: Arc<BackendInner>,
}

struct BackendInner {
    collections: Mutex<HashMap<&'static str, Vec<Value>>>,
    cart: Mutex<Vec<Value>>,
    settings: Mutex<Value>,
    requests: Mutex<Vec<RecordedRequest>>,
    offline: AtomicBool,
    next_id: AtomicI64,
}

/// In-process REST backend seeded with the bundled datasets.
pub struct FakeBackend {
    addr: SocketAddr,
    state: BackendState,
    server: JoinHandle<()>,
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl FakeBackend {
    /// Password accepted by `/auth/login`.
    pub const PASSWORD: &'static str = "correct horse";

    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = BackendState {
            inner: Arc::new(BackendInner {
                collections: Mutex::new(seed_collections()),
                cart: Mutex::new(Vec::new()),
                settings: Mutex::new(to_value(&SiteSettings::default())),
                requests: Mutex::new(Vec::new()),
                offline: AtomicBool::new(false),
                next_id: AtomicI64::new(FIRST_SERVER_ID),
            }),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Listener has no address");
        let app = router(state.clone());
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Configuration pointing at this backend with storage in `dir`.
    ///
    /// # Panics
    ///
    /// Panics if the base URL does not parse.
    #[must_use]
    pub fn config(&self, dir: &Path) -> ShopConfig {
        config_for(&self.base_url(), dir)
    }

    /// Assemble an application over this backend with storage in `dir`.
    ///
    /// # Panics
    ///
    /// Panics if storage cannot be opened.
    pub async fn app(&self, dir: &Path) -> AppState {
        AppState::new(self.config(dir))
            .await
            .expect("Failed to build app state")
    }

    /// Answer every request with 503 while `offline` is set.
    pub fn set_offline(&self, offline: bool) {
        self.state.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state.inner.requests).clone()
    }

    /// Requests whose path starts with `/api/{prefix}`.
    #[must_use]
    pub fn requests_to(&self, prefix: &str) -> usize {
        let prefix = format!("/api/{prefix}");
        lock(&self.state.inner.requests)
            .iter()
            .filter(|r| r.path.starts_with(&prefix))
            .count()
    }

    /// Current server-side copy of a collection.
    #[must_use]
    pub fn collection(&self, name: &str) -> Vec<Value> {
        lock(&self.state.inner.collections)
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Current server-side cart lines.
    #[must_use]
    pub fn cart(&self) -> Vec<Value> {
        lock(&self.state.inner.cart).clone()
    }

    /// Current server-side settings document.
    #[must_use]
    pub fn settings(&self) -> Value {
        lock(&self.state.inner.settings).clone()
    }
}

/// Configuration for `base_url` with storage in `dir`.
///
/// # Panics
///
/// Panics if `base_url` does not parse.
#[must_use]
pub fn config_for(base_url: &str, dir: &Path) -> ShopConfig {
    ShopConfig {
        api: ApiConfig::for_base_url(base_url).expect("Invalid base URL"),
        storage_dir: dir.to_path_buf(),
        content_policy: ContentPolicy::Sanitized,
    }
}

/// Application whose backend is unreachable.
///
/// # Panics
///
/// Panics if storage cannot be opened.
pub async fn offline_app(dir: &Path) -> AppState {
    AppState::new(config_for(UNREACHABLE_URL, dir))
        .await
        .expect("Failed to build app state")
}

/// Second application over the same storage as `app`, like a second
/// browser window.
///
/// # Panics
///
/// Panics if the state cannot be assembled.
pub async fn second_window(app: &AppState) -> AppState {
    AppState::with_storage(app.config().clone(), app.storage().fork())
        .await
        .expect("Failed to build second app state")
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

// ============================================================================
// Server
// ============================================================================

fn router(state: BackendState) -> Router {
    Router::new()
        .route("/api/settings", get(get_settings).put(put_settings))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route(
            "/api/cart",
            get(list_cart).post(add_cart_line).delete(clear_cart),
        )
        .route(
            "/api/cart/{id}",
            put(update_cart_line).delete(remove_cart_line),
        )
        .route("/api/{collection}", get(list).post(create))
        .route("/api/{collection}/{id}", put(update).delete(remove))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

async fn record(State(state): State<BackendState>, request: Request, next: Next) -> Response {
    lock(&state.inner.requests).push(RecordedRequest {
        method: request.method().clone(),
        path: request.uri().path().to_string(),
        authorization: request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned),
    });

    if state.inner.offline.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "backend offline").into_response();
    }
    next.run(request).await
}

fn ok(data: Value) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn ack() -> Response {
    Json(json!({ "success": true })).into_response()
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn id_text(value: &Value) -> String {
    match value.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

async fn list(State(state): State<BackendState>, UrlPath(collection): UrlPath<String>) -> Response {
    match lock(&state.inner.collections).get(collection.as_str()) {
        Some(items) => ok(Value::Array(items.clone())),
        None => fail(StatusCode::NOT_FOUND, "Unknown collection"),
    }
}

async fn create(
    State(state): State<BackendState>,
    UrlPath(collection): UrlPath<String>,
    Json(mut body): Json<Value>,
) -> Response {
    let mut collections = lock(&state.inner.collections);
    let Some(items) = collections.get_mut(collection.as_str()) else {
        return fail(StatusCode::NOT_FOUND, "Unknown collection");
    };
    let Some(object) = body.as_object_mut() else {
        return fail(StatusCode::BAD_REQUEST, "Expected an object");
    };

    // Orders keep the code the client generated; everything else gets a
    // server id.
    if collection != "orders" || !object.get("id").is_some_and(Value::is_string) {
        let id = state.inner.next_id.fetch_add(1, Ordering::SeqCst);
        object.insert("id".to_owned(), Value::from(id));
    }
    items.push(body.clone());
    ok(body)
}

async fn update(
    State(state): State<BackendState>,
    UrlPath((collection, id)): UrlPath<(String, String)>,
    Json(patch): Json<Value>,
) -> Response {
    let mut collections = lock(&state.inner.collections);
    let Some(item) = collections
        .get_mut(collection.as_str())
        .and_then(|items| items.iter_mut().find(|item| id_text(item) == id))
    else {
        return fail(StatusCode::NOT_FOUND, "Not found");
    };
    merge(item, &patch);
    ok(item.clone())
}

async fn remove(
    State(state): State<BackendState>,
    UrlPath((collection, id)): UrlPath<(String, String)>,
) -> Response {
    let mut collections = lock(&state.inner.collections);
    let Some(items) = collections.get_mut(collection.as_str()) else {
        return fail(StatusCode::NOT_FOUND, "Unknown collection");
    };
    let before = items.len();
    items.retain(|item| id_text(item) != id);
    if items.len() == before {
        return fail(StatusCode::NOT_FOUND, "Not found");
    }
    ack()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartLineRequest {
    product_id: i64,
    quantity: u32,
}

#[derive(Deserialize)]
struct QuantityRequest {
    quantity: u32,
}

async fn list_cart(State(state): State<BackendState>) -> Response {
    ok(Value::Array(lock(&state.inner.cart).clone()))
}

async fn add_cart_line(
    State(state): State<BackendState>,
    Json(request): Json<CartLineRequest>,
) -> Response {
    let product = lock(&state.inner.collections)
        .get("products")
        .and_then(|items| {
            items
                .iter()
                .find(|p| p.get("id").and_then(Value::as_i64) == Some(request.product_id))
                .cloned()
        });
    let Some(product) = product else {
        return fail(StatusCode::NOT_FOUND, "Unknown product");
    };

    let mut cart = lock(&state.inner.cart);
    let id = request.product_id.to_string();
    cart.retain(|line| line.get("product").map(id_text).as_deref() != Some(id.as_str()));
    cart.push(json!({ "product": product, "quantity": request.quantity }));
    ack()
}

async fn update_cart_line(
    State(state): State<BackendState>,
    UrlPath(id): UrlPath<String>,
    Json(request): Json<QuantityRequest>,
) -> Response {
    let mut cart = lock(&state.inner.cart);
    let Some(line) = cart
        .iter_mut()
        .find(|line| line.get("product").map(id_text).as_deref() == Some(id.as_str()))
    else {
        return fail(StatusCode::NOT_FOUND, "Not in cart");
    };
    merge(line, &json!({ "quantity": request.quantity }));
    ack()
}

async fn remove_cart_line(State(state): State<BackendState>, UrlPath(id): UrlPath<String>) -> Response {
    lock(&state.inner.cart)
        .retain(|line| line.get("product").map(id_text).as_deref() != Some(id.as_str()));
    ack()
}

async fn clear_cart(State(state): State<BackendState>) -> Response {
    lock(&state.inner.cart).clear();
    ack()
}

async fn get_settings(State(state): State<BackendState>) -> Response {
    ok(lock(&state.inner.settings).clone())
}

async fn put_settings(State(state): State<BackendState>, Json(settings): Json<Value>) -> Response {
    *lock(&state.inner.settings) = settings;
    ack()
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(Json(request): Json<LoginRequest>) -> Response {
    if request.password != FakeBackend::PASSWORD {
        return fail(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    ok(json!({
        "token": format!("session-{}", request.email),
        "user": { "email": request.email, "name": "Quản trị viên" },
    }))
}

async fn logout() -> Response {
    ack()
}

// ============================================================================
// Seed data
// ============================================================================

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn to_values<T: serde::Serialize>(items: &[T]) -> Vec<Value> {
    items.iter().map(to_value).collect()
}

fn seed_collections() -> HashMap<&'static str, Vec<Value>> {
    let mut collections = HashMap::new();
    for name in COLLECTIONS {
        let items = match name {
            "products" => to_values(&fallback::products()),
            "orders" => to_values(&fallback::orders()),
            "users" => to_values(&fallback::users()),
            "testimonials" => to_values(&fallback::testimonials()),
            _ => to_values(&fallback::blog_posts()),
        };
        collections.insert(name, items);
    }
    collections
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
