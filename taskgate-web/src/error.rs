/// Error handling for the web server
///
/// Handlers return `WebResult<T>`. Expected outcomes (failed login, duplicate
/// email, missing session) are normal responses and never reach this type;
/// `WebError` covers what is left, chiefly store failures at request time.
/// Internal details are logged and replaced by a generic page.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::fmt;
use taskgate_shared::{auth::flow::AuthError, auth::password::PasswordError, error::StoreError};

/// Web result type alias
pub type WebResult<T> = Result<T, WebError>;

/// Unified web error type
#[derive(Debug)]
pub enum WebError {
    /// Not found (404)
    NotFound,

    /// Internal server error (500)
    InternalError(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::NotFound => write!(f, "Not found"),
            WebError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for WebError {}

fn error_page(status: StatusCode, title: &str, message: &str) -> Response {
    let body = format!(
        "<!doctype html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title}</title>\
         <link rel=\"stylesheet\" href=\"/style.css\"></head>\n\
         <body><main class=\"error\"><h1>{title}</h1><p>{message}</p>\
         <p><a href=\"/\">Back to home</a></p></main></body>\n</html>\n"
    );

    (status, Html(body)).into_response()
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::NotFound => error_page(
                StatusCode::NOT_FOUND,
                "Page not found",
                "The page you requested does not exist.",
            ),
            WebError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong",
                    "An internal error occurred. Please try again later.",
                )
            }
        }
    }
}

impl From<StoreError> for WebError {
    fn from(err: StoreError) -> Self {
        WebError::InternalError(format!("Store error: {}", err))
    }
}

impl From<PasswordError> for WebError {
    fn from(err: PasswordError) -> Self {
        WebError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Only reached for auth outcomes a handler did not turn into a page
impl From<AuthError> for WebError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(e) => e.into(),
            AuthError::Password(e) => e.into(),
            other => WebError::InternalError(format!("Unhandled auth outcome: {}", other)),
        }
    }
}

impl From<minijinja::Error> for WebError {
    fn from(err: minijinja::Error) -> Self {
        WebError::InternalError(format!("Template error: {:#}", err))
    }
}
