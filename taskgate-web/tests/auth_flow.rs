/// End-to-end tests of the session-authenticated pages
///
/// Every test builds its own app over fresh in-memory stores.

mod common;

use axum::http::{header, StatusCode};
use common::{body_string, location, session_cookie, set_cookies, TestContext};

const REGISTERED: &str = "user created successfully, please login";
const BAD_LOGIN: &str = "login or password is incorrect";

#[tokio::test]
async fn test_register_then_login() {
    let ctx = TestContext::new();

    let response = ctx.register("u@x.com", "p1", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));

    let response = ctx.login_response("u@x.com", "p1", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/dashboard"));

    let cookie = set_cookies(&response)
        .into_iter()
        .find(|c| c.starts_with("sid="))
        .unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=3600"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_registration_flash_shown_exactly_once() {
    let ctx = TestContext::new();

    let response = ctx.register("u@x.com", "p1", "").await;
    let cookie = session_cookie(&response).expect("anonymous session carries the flash");

    let page = body_string(ctx.get("/login", Some(&cookie)).await).await;
    assert!(page.contains(REGISTERED));

    let page = body_string(ctx.get("/login", Some(&cookie)).await).await;
    assert!(!page.contains(REGISTERED));
}

#[tokio::test]
async fn test_duplicate_normalized_email_rejected() {
    let ctx = TestContext::new();
    ctx.register("a@b.com", "p1", "").await;

    let response = ctx.register("A@B.com ", "p2", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/register"));

    let cookie = session_cookie(&response).unwrap();
    let page = body_string(ctx.get("/register", Some(&cookie)).await).await;
    assert!(page.contains("user exists"));

    // The original password still works, the second one was never stored
    let response = ctx.login_response("a@b.com", "p2", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    ctx.login("a@b.com", "p1").await;
}

#[tokio::test]
async fn test_invalid_registration_flashes_reason() {
    let ctx = TestContext::new();

    let response = ctx.register("not-an-email", "p1", "").await;
    assert_eq!(location(&response), Some("/register"));
    let cookie = session_cookie(&response).unwrap();
    let page = body_string(ctx.get("/register", Some(&cookie)).await).await;
    assert!(page.contains("a valid email is required"));

    let response = ctx.post_form("/register", "email=u%40x.com", None).await;
    assert_eq!(location(&response), Some("/register"));
    let cookie = session_cookie(&response).unwrap();
    let page = body_string(ctx.get("/register", Some(&cookie)).await).await;
    assert!(page.contains("password is required"));
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_are_identical() {
    let ctx = TestContext::new();
    ctx.register("u@x.com", "p1", "").await;

    let wrong_password = ctx.login_response("u@x.com", "nope", None).await;
    let unknown_email = ctx.login_response("ghost@x.com", "p1", None).await;

    assert_eq!(wrong_password.status(), StatusCode::OK);
    assert_eq!(unknown_email.status(), StatusCode::OK);
    assert!(set_cookies(&wrong_password).is_empty());
    assert!(set_cookies(&unknown_email).is_empty());

    let wrong_password = body_string(wrong_password).await;
    let unknown_email = body_string(unknown_email).await;
    assert!(wrong_password.contains(BAD_LOGIN));
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn test_empty_login_form_gets_generic_error() {
    let ctx = TestContext::new();

    let response = ctx.post_form("/login", "", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains(BAD_LOGIN));
}

#[tokio::test]
async fn test_dashboard_requires_session() {
    let ctx = TestContext::new();

    let response = ctx.get("/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));

    let response = ctx.get("/dashboard", Some("sid=garbage")).await;
    assert_eq!(location(&response), Some("/login"));

    let response = ctx
        .get("/dashboard", Some("sid=tg_0123456789abcdefghijABCDEFGHIJklmnopqrstu"))
        .await;
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_anonymous_flash_session_does_not_open_dashboard() {
    let ctx = TestContext::new();

    let response = ctx.register("u@x.com", "p1", "").await;
    let cookie = session_cookie(&response).unwrap();

    let response = ctx.get("/dashboard", Some(&cookie)).await;
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_admin_dashboard_lists_only_admin_tasks() {
    let ctx = TestContext::new();
    ctx.seed_tasks(&[
        ("admin", "Rotate signing keys"),
        ("user", "Update profile"),
        ("admin", "Review audit log"),
    ])
    .await;

    ctx.register("u@x.com", "p1", "admin").await;
    let cookie = ctx.login("u@x.com", "p1").await;

    let response = ctx.get("/dashboard", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );

    let page = body_string(response).await;
    assert!(page.contains("u@x.com"));
    assert!(page.contains("Rotate signing keys"));
    assert!(page.contains("Review audit log"));
    assert!(!page.contains("Update profile"));
    assert!(page.contains("href=\"/logout\""));
}

#[tokio::test]
async fn test_dashboard_without_matching_tasks() {
    let ctx = TestContext::new();
    ctx.seed_tasks(&[("admin", "Rotate signing keys")]).await;

    ctx.register("u@x.com", "p1", "").await;
    let cookie = ctx.login("u@x.com", "p1").await;

    let page = body_string(ctx.get("/dashboard", Some(&cookie)).await).await;
    assert!(page.contains("No tasks for your role."));
    assert!(!page.contains("Rotate signing keys"));
}

#[tokio::test]
async fn test_logout_destroys_session() {
    let ctx = TestContext::new();
    ctx.register("u@x.com", "p1", "").await;
    let cookie = ctx.login("u@x.com", "p1").await;
    let token = cookie.trim_start_matches("sid=").to_string();

    assert!(ctx.sessions.resolve(&token).await.unwrap().is_some());

    let response = ctx.get("/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
    assert!(set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("sid=;") && c.contains("Max-Age=0")));

    assert!(ctx.sessions.resolve(&token).await.unwrap().is_none());

    let response = ctx.get("/dashboard", Some(&cookie)).await;
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_logout_twice_is_harmless() {
    let ctx = TestContext::new();
    ctx.register("u@x.com", "p1", "").await;
    let cookie = ctx.login("u@x.com", "p1").await;

    for _ in 0..2 {
        let response = ctx.get("/logout", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/login"));
    }

    let response = ctx.get("/logout", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_replaces_previous_session() {
    let ctx = TestContext::new();
    ctx.register("u@x.com", "p1", "").await;

    let first = ctx.login("u@x.com", "p1").await;
    let response = ctx.login_response("u@x.com", "p1", Some(&first)).await;
    let second = session_cookie(&response).unwrap();
    assert_ne!(first, second);

    let response = ctx.get("/dashboard", Some(&first)).await;
    assert_eq!(location(&response), Some("/login"));

    let response = ctx.get("/dashboard", Some(&second)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_nav_reflects_session() {
    let ctx = TestContext::new();

    let page = body_string(ctx.get("/", None).await).await;
    assert!(page.contains("href=\"/login\""));
    assert!(!page.contains("href=\"/logout\""));

    ctx.register("u@x.com", "p1", "").await;
    let cookie = ctx.login("u@x.com", "p1").await;

    let page = body_string(ctx.get("/", Some(&cookie)).await).await;
    assert!(page.contains("href=\"/logout\""));
    assert!(page.contains("u@x.com"));
}

#[tokio::test]
async fn test_purge_keeps_live_sessions() {
    let ctx = TestContext::new();
    ctx.register("u@x.com", "p1", "").await;
    ctx.login("u@x.com", "p1").await;

    // Nothing has expired yet: both the flash session and the login survive
    assert_eq!(ctx.sessions.purge_expired().await.unwrap(), 0);
    assert_eq!(ctx.session_store.len().await, 2);
}
