/// Authentication actions
///
/// # Endpoints
///
/// - `POST /register` - create an account, then redirect to `/login`
/// - `POST /login` - open a session, then redirect to `/dashboard`
/// - `GET /logout` - close the session, then redirect to `/login`
///
/// Forms are `application/x-www-form-urlencoded`. Missing fields are read as
/// empty strings and reported like any other invalid input.

use crate::{
    app::AppState,
    error::WebResult,
    middleware::session::{removal_cookie, session_cookie, RequestSession},
    templates::View,
};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use minijinja::context;
use serde::Deserialize;
use taskgate_shared::{
    auth::flow::{AuthError, LoginInput, RegisterInput, INVALID_CREDENTIALS_MESSAGE},
    models::session::Flash,
};

/// Message queued after a successful registration
pub const REGISTERED_MESSAGE: &str = "user created successfully, please login";

/// Registration form
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

/// Login form
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Queues `flash` on the visitor's session, starting one if needed
async fn flash_and_redirect(
    state: &AppState,
    jar: CookieJar,
    session: &RequestSession,
    flash: Flash,
    to: &str,
) -> WebResult<(CookieJar, Redirect)> {
    let jar = match state.sessions.flash(session.token.as_deref(), flash).await? {
        Some(token) => jar.add(session_cookie(&state.config.session, token)),
        None => jar,
    };

    Ok((jar, Redirect::to(to)))
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /register
/// Content-Type: application/x-www-form-urlencoded
///
/// email=u%40x.com&password=p1&role=admin
/// ```
///
/// # Response
///
/// Always `303 See Other`:
///
/// - success: to `/login` with a success flash
/// - taken email: to `/register` with the error flash "user exists"
/// - invalid input: to `/register` with the validation message
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    session: RequestSession,
    Form(form): Form<RegisterForm>,
) -> WebResult<(CookieJar, Redirect)> {
    let input = RegisterInput {
        email: form.email,
        password: form.password,
        role: form.role,
    };

    match state.auth.register(input).await {
        Ok(_) => {
            flash_and_redirect(&state, jar, &session, Flash::success(REGISTERED_MESSAGE), "/login")
                .await
        }
        Err(e @ (AuthError::DuplicateEmail | AuthError::Validation(_))) => {
            flash_and_redirect(&state, jar, &session, Flash::error(e.to_string()), "/register")
                .await
        }
        Err(e) => Err(e.into()),
    }
}

/// Log in
///
/// On success the previous session cookie, if any, is replaced by a fresh
/// session and the browser is sent to `/dashboard`. On failure the login page
/// is rendered again with one generic message, whatever the cause.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    session: RequestSession,
    Form(form): Form<LoginForm>,
) -> WebResult<Response> {
    let input = LoginInput {
        email: form.email,
        password: form.password,
    };

    match state.auth.login(input).await {
        Ok((identity, token)) => {
            if let Some(previous) = &session.token {
                state.sessions.destroy(previous).await?;
            }

            tracing::info!(email = %identity.email, role = %identity.role, "User logged in");

            let jar = jar.add(session_cookie(&state.config.session, token));
            Ok((jar, Redirect::to("/dashboard")).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            let page = state
                .render(
                    View::Login,
                    &session,
                    context! { login_error => INVALID_CREDENTIALS_MESSAGE },
                )
                .await?;

            Ok(page.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Log out
///
/// Idempotent: a missing, unknown or already destroyed session still ends in
/// a cleared cookie and a redirect to `/login`.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    session: RequestSession,
) -> WebResult<(CookieJar, Redirect)> {
    if let Some(token) = &session.token {
        state.sessions.destroy(token).await?;
    }

    if let Some(identity) = &session.identity {
        tracing::info!(email = %identity.email, "User logged out");
    }

    let jar = jar.remove(removal_cookie(&state.config.session));
    Ok((jar, Redirect::to("/login")))
}
