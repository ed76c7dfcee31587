//! Login, bearer tokens and logout.

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use template_shop_integration_tests::FakeBackend;

#[tokio::test]
async fn test_login_attaches_token_until_logout() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = backend.app(dir.path()).await;
    assert!(!app.auth().is_authenticated().await);

    let response = app
        .auth()
        .login("admin@templateshop.vn", &SecretString::from(FakeBackend::PASSWORD))
        .await
        .unwrap();
    assert!(response.user.is_some());
    assert!(app.auth().is_authenticated().await);

    app.orders().ensure_loaded().await;
    let orders_request = backend
        .requests()
        .into_iter()
        .rfind(|r| r.path == "/api/orders")
        .unwrap();
    assert_eq!(
        orders_request.authorization.as_deref(),
        Some("Bearer session-admin@templateshop.vn")
    );

    app.auth().logout().await.unwrap();
    assert!(!app.auth().is_authenticated().await);

    app.users().ensure_loaded().await;
    let users_request = backend
        .requests()
        .into_iter()
        .rfind(|r| r.path == "/api/users")
        .unwrap();
    assert!(users_request.authorization.is_none());
}

#[tokio::test]
async fn test_wrong_password_stores_nothing() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = backend.app(dir.path()).await;

    let result = app
        .auth()
        .login("admin@templateshop.vn", &SecretString::from("guess"))
        .await;

    assert!(result.is_err());
    assert!(!app.auth().is_authenticated().await);
}

#[tokio::test]
async fn test_logout_succeeds_while_backend_is_down() {
    let backend = FakeBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = backend.app(dir.path()).await;
    app.auth()
        .login("admin@templateshop.vn", &SecretString::from(FakeBackend::PASSWORD))
        .await
        .unwrap();

    backend.set_offline(true);
    app.auth().logout().await.unwrap();
    assert!(!app.auth().is_authenticated().await);
}
