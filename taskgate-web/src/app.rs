/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskgate_shared::db::{pool::{create_pool, DatabaseConfig}, Stores};
/// use taskgate_web::{app::{build_router, AppState}, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
///
/// let state = AppState::new(Stores::postgres(pool), config)?;
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3500").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::WebResult,
    middleware::{security::SecurityHeadersLayer, session::RequestSession},
    templates::{MiniJinjaEngine, TemplateEngine, View},
};
use axum::{handler::HandlerWithoutStateExt, response::Html, routing::get, Router};
use minijinja::{context, Value};
use std::sync::Arc;
use taskgate_shared::{
    auth::{flow::AuthFlow, session::SessionManager},
    db::Stores,
    models::session::FlashKind,
};
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub sessions: SessionManager,
    pub auth: AuthFlow,
    pub templates: Arc<dyn TemplateEngine>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the session manager, auth flow and templates over `stores`
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded template fails to compile.
    pub fn new(stores: Stores, config: Config) -> Result<Self, minijinja::Error> {
        let sessions = SessionManager::new(stores.sessions.clone(), config.session.ttl_seconds);
        let auth = AuthFlow::new(stores.users.clone(), sessions.clone());

        Ok(Self {
            stores,
            sessions,
            auth,
            templates: Arc::new(MiniJinjaEngine::new()?),
            config: Arc::new(config),
        })
    }

    /// Renders `view` for the current request
    ///
    /// Adds `user`, `success` and `error` to `extra`. Pending flashes are
    /// drained, so each one is shown on exactly one page.
    pub async fn render(
        &self,
        view: View,
        session: &RequestSession,
        extra: Value,
    ) -> WebResult<Html<String>> {
        let flashes = match &session.token {
            Some(token) => self.sessions.take_flashes(token).await?,
            None => Vec::new(),
        };

        let (success, error): (Vec<_>, Vec<_>) = flashes
            .into_iter()
            .partition(|flash| flash.kind == FlashKind::Success);
        let success: Vec<String> = success.into_iter().map(|flash| flash.text).collect();
        let error: Vec<String> = error.into_iter().map(|flash| flash.text).collect();

        let html = self.templates.render(
            view.template_name(),
            context! {
                user => session.email(),
                success => success,
                error => error,
                ..extra
            },
        )?;

        Ok(Html(html))
    }
}

/// Builds the complete router with all routes and middleware
///
/// ```text
/// GET  /            landing page
/// GET  /register    registration form
/// POST /register    create account
/// GET  /login       login form
/// POST /login       open session
/// GET  /dashboard   tasks for the session's role
/// GET  /logout      close session
/// GET  /health      store health (JSON)
/// GET  *            static assets, else 404
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let assets = ServeDir::new(&state.config.server.assets_dir)
        .not_found_service(routes::pages::not_found.into_service());

    Router::new()
        .route("/", get(routes::pages::home))
        .route(
            "/register",
            get(routes::pages::register_form).post(routes::auth::register),
        )
        .route("/login", get(routes::pages::login_form).post(routes::auth::login))
        .route("/logout", get(routes::auth::logout))
        .route("/dashboard", get(routes::dashboard::dashboard))
        .route("/health", get(routes::health::health_check))
        .fallback_service(assets)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SecurityHeadersLayer::new(state.config.server.production))
        .with_state(state)
}

