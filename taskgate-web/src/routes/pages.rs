/// Form and landing pages
///
/// Each page drains and shows any pending flash messages.

use crate::{
    app::AppState,
    error::{WebError, WebResult},
    middleware::session::RequestSession,
    templates::View,
};
use axum::{extract::State, response::Html};
use minijinja::context;

/// `GET /`
pub async fn home(
    State(state): State<AppState>,
    session: RequestSession,
) -> WebResult<Html<String>> {
    state.render(View::Main, &session, context! {}).await
}

/// `GET /register`
pub async fn register_form(
    State(state): State<AppState>,
    session: RequestSession,
) -> WebResult<Html<String>> {
    state.render(View::Register, &session, context! {}).await
}

/// `GET /login`
pub async fn login_form(
    State(state): State<AppState>,
    session: RequestSession,
) -> WebResult<Html<String>> {
    state.render(View::Login, &session, context! {}).await
}

/// Fallback for paths that match neither a route nor a static file
pub async fn not_found() -> WebError {
    WebError::NotFound
}
