//! Common test utilities for integration tests
//!
//! The app is built over in-memory stores and driven through
//! `tower::Service::call`, so no database or socket is needed.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use std::path::PathBuf;
use std::sync::Arc;
use taskgate_shared::auth::session::SessionManager;
use taskgate_shared::db::memory::{MemorySessionStore, MemoryTaskStore, MemoryUserStore};
use taskgate_shared::db::Stores;
use taskgate_shared::models::task::Task;
use taskgate_web::app::{build_router, AppState};
use taskgate_web::config::{Config, DatabaseConfig, ServerConfig, SessionConfig};
use tower::Service as _;

/// Test context holding the app and handles on its stores
pub struct TestContext {
    pub app: axum::Router,
    pub sessions: SessionManager,
    pub tasks: Arc<MemoryTaskStore>,
    pub session_store: Arc<MemorySessionStore>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_production(false)
    }

    pub fn with_production(production: bool) -> Self {
        let tasks = Arc::new(MemoryTaskStore::new());
        let session_store = Arc::new(MemorySessionStore::new());
        let stores = Stores {
            users: Arc::new(MemoryUserStore::new()),
            tasks: tasks.clone(),
            sessions: session_store.clone(),
            pool: None,
        };

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                production,
                assets_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets"),
            },
            database: DatabaseConfig {
                url: "postgresql://unused".to_string(),
                max_connections: 1,
            },
            session: SessionConfig {
                cookie_secure: production,
                ..Default::default()
            },
        };

        let state = AppState::new(stores, config).expect("templates compile");
        let sessions = state.sessions.clone();

        TestContext {
            app: build_router(state),
            sessions,
            tasks,
            session_store,
        }
    }

    /// Adds tasks to the task store
    pub async fn seed_tasks(&self, tasks: &[(&str, &str)]) {
        self.tasks
            .extend(
                tasks
                    .iter()
                    .map(|(role, title)| Task::new(*role, *title, serde_json::json!({}))),
            )
            .await;
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        self.app
            .clone()
            .call(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        self.app
            .clone()
            .call(request.body(Body::from(form.to_string())).unwrap())
            .await
            .unwrap()
    }

    /// Registers an account and returns the response
    pub async fn register(&self, email: &str, password: &str, role: &str) -> Response<Body> {
        let form = format!(
            "email={}&password={}&role={}",
            encode(email),
            encode(password),
            encode(role)
        );
        self.post_form("/register", &form, None).await
    }

    /// Logs in and returns the session cookie pair (`sid=...`)
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self.login_response(email, password, None).await;
        session_cookie(&response).expect("login should set the session cookie")
    }

    pub async fn login_response(
        &self,
        email: &str,
        password: &str,
        cookie: Option<&str>,
    ) -> Response<Body> {
        let form = format!("email={}&password={}", encode(email), encode(password));
        self.post_form("/login", &form, cookie).await
    }
}

/// Percent-encodes the characters used in test form values
pub fn encode(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('@', "%40")
        .replace('&', "%26")
        .replace('+', "%2B")
        .replace(' ', "+")
}

/// Returns `sid=<value>` from a response's `Set-Cookie` headers, if a
/// non-empty session cookie was set
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .find(|pair| pair.starts_with("sid=") && pair.len() > "sid=".len())
        .map(str::to_string)
}

/// Returns every `Set-Cookie` header as a string
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

pub async fn body_string(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}
