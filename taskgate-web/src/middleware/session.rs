/// Session cookie handling
///
/// [`RequestSession`] reads the session cookie and resolves it once per
/// request. A missing, malformed or expired cookie is not an error: the
/// request simply has no identity.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use taskgate_shared::auth::session::SessionToken;
use taskgate_shared::models::session::Identity;

use crate::{app::AppState, config::SessionConfig, error::WebError};

/// The session attached to the current request
#[derive(Debug, Clone, Default)]
pub struct RequestSession {
    /// Raw cookie value, if the client sent one
    pub token: Option<String>,

    /// Identity the token resolved to
    pub identity: Option<Identity>,
}

impl RequestSession {
    pub fn email(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.email.as_str())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequestSession {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar
            .get(&state.config.session.cookie_name)
            .map(|cookie| cookie.value().to_string())
        else {
            return Ok(Self::default());
        };

        let identity = state.sessions.resolve(&token).await?;

        Ok(Self {
            token: Some(token),
            identity,
        })
    }
}

/// Builds the session cookie carrying `token`
pub fn session_cookie(config: &SessionConfig, token: SessionToken) -> Cookie<'static> {
    cookie_with_value(config, token.into_string())
}

fn cookie_with_value(config: &SessionConfig, value: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(config.ttl_seconds))
        .secure(config.cookie_secure)
        .build()
}

/// Builds a cookie that removes the session cookie when passed to
/// [`CookieJar::remove`]
pub fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), ""))
        .path("/")
        .build()
}
