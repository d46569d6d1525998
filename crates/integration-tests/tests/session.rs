//! Session store against the fake service, through the HTTP identity gateway.
//!
//! Run with: cargo test -p sweet-shop-integration-tests

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use sweet_shop_client::MemoryPersistence;
use sweet_shop_core::{Credentials, Registration, Role};
use sweet_shop_integration_tests::{FakeSweetShop, TOKEN_LIFETIME_MS};

#[tokio::test]
async fn test_login_with_wrong_password_stays_anonymous() {
    let shop = FakeSweetShop::start().await.unwrap();
    let stores = shop.stores().unwrap();

    let err = stores
        .session
        .login(&Credentials::new("admin", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.message(), "Invalid username or password");
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(
        stores.session.status().last_error.as_deref(),
        Some("Invalid username or password")
    );
    assert!(!stores.session.is_authenticated());
    assert!(!stores.session.is_admin());
    assert!(stores.storage.entry("authToken").is_none());
}

#[tokio::test]
async fn test_admin_login_persists_session() {
    let shop = FakeSweetShop::start().await.unwrap();
    let stores = shop.stores().unwrap();

    let identity = stores
        .session
        .login(&Credentials::new("admin", "admin123"))
        .await
        .unwrap();

    assert_eq!(identity.role, Role::Admin);
    assert_eq!(identity.expires_in_ms, Some(TOKEN_LIFETIME_MS));
    assert!(stores.session.is_admin());
    assert_eq!(
        stores.storage.entry("authToken").as_deref(),
        Some(identity.token.expose_secret())
    );

    // A reload restores the session from storage without a round trip
    let before = shop.requests().len();
    let reloaded = shop.stores_with(Arc::clone(&stores.storage)).unwrap();
    assert!(reloaded.session.is_admin());
    assert_eq!(shop.requests().len(), before);
    reloaded.inventory.fetch_all().await.unwrap();
}

#[tokio::test]
async fn test_customer_role_from_user_wire_value() {
    let shop = FakeSweetShop::start().await.unwrap();
    let stores = shop.stores().unwrap();

    let identity = stores
        .session
        .login(&Credentials::new("customer", "customer123"))
        .await
        .unwrap();
    assert_eq!(identity.role, Role::Customer);
    assert!(stores.session.is_authenticated());
    assert!(!stores.session.is_admin());
}

#[tokio::test]
async fn test_register_signs_in_new_account() {
    let shop = FakeSweetShop::start().await.unwrap();
    let stores = shop.stores().unwrap();

    let identity = stores
        .session
        .register(&Registration::new("penny", "penny@sweetshop.test", "lollipop"))
        .await
        .unwrap();
    assert_eq!(identity.username, "penny");
    assert_eq!(identity.email.as_deref(), Some("penny@sweetshop.test"));
    assert_eq!(identity.role, Role::Customer);

    stores.inventory.fetch_all().await.unwrap();
}

#[tokio::test]
async fn test_register_conflict_keeps_existing_session() {
    let shop = FakeSweetShop::start().await.unwrap();
    let stores = shop.stores().unwrap();
    stores
        .session
        .login(&Credentials::new("customer", "customer123"))
        .await
        .unwrap();

    let err = stores
        .session
        .register(&Registration::new("admin", "new@sweetshop.test", "password"))
        .await
        .unwrap_err();
    assert_eq!(err.message(), "Username already exists");
    assert_eq!(err.status(), Some(StatusCode::CONFLICT));
    assert_eq!(stores.session.identity().unwrap().username, "customer");
}

#[tokio::test]
async fn test_register_validation_uses_fallback() {
    let shop = FakeSweetShop::start().await.unwrap();
    let stores = shop.stores().unwrap();

    let err = stores
        .session
        .register(&Registration::new("al", "not-an-email", "123"))
        .await
        .unwrap_err();
    assert_eq!(err.message(), "Registration failed");
    assert!(!stores.session.is_authenticated());
}

#[tokio::test]
async fn test_login_without_error_body_uses_fallback() {
    let shop = FakeSweetShop::start().await.unwrap();
    let stores = shop.stores().unwrap();

    shop.fail_next(StatusCode::SERVICE_UNAVAILABLE, "<html>down</html>");
    let err = stores
        .session
        .login(&Credentials::new("admin", "admin123"))
        .await
        .unwrap_err();
    assert_eq!(err.message(), "Login failed");
    assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
}

#[tokio::test]
async fn test_logout_drops_token_from_requests() {
    let shop = FakeSweetShop::start().await.unwrap();
    let stores = shop.stores().unwrap();
    stores
        .session
        .login(&Credentials::new("customer", "customer123"))
        .await
        .unwrap();
    stores.inventory.fetch_all().await.unwrap();

    stores.session.logout();
    assert!(!stores.session.is_authenticated());
    assert!(stores.storage.entry("user").is_none());
    assert!(stores.storage.entry("authToken").is_none());

    let err = stores.inventory.fetch_all().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    let last = shop.requests().pop().unwrap();
    assert_eq!(last.authorization, None);
}

#[tokio::test]
async fn test_stale_persisted_token_fails_on_next_call() {
    let shop = FakeSweetShop::start().await.unwrap();
    let storage = Arc::new(MemoryPersistence::new());
    storage.set_entry("user", r#"{"username":"ghost","role":"ADMIN"}"#);
    storage.set_entry("authToken", "expired-token");

    let stores = shop.stores_with(storage).unwrap();
    assert!(stores.session.is_authenticated());
    assert!(stores.session.is_admin());

    let err = stores.inventory.fetch_all().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(err.message(), "Invalid or expired token");
}
