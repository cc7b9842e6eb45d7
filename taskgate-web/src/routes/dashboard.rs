/// Role-scoped dashboard
///
/// `GET /dashboard` lists the tasks whose role equals the signed-in user's
/// role. Without a live session the browser is sent to `/login`.

use crate::{app::AppState, error::WebResult, middleware::session::RequestSession, templates::View};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use minijinja::{context, Value};

pub async fn dashboard(
    State(state): State<AppState>,
    session: RequestSession,
) -> WebResult<Response> {
    let Some(identity) = &session.identity else {
        return Ok(Redirect::to("/login").into_response());
    };

    let tasks = state.stores.tasks.list_by_role(&identity.role).await?;
    tracing::debug!(role = %identity.role, count = tasks.len(), "Listing tasks");

    let page = state
        .render(
            View::Dashboard,
            &session,
            context! { tasks => Value::from_serialize(&tasks) },
        )
        .await?;

    Ok(([(header::CACHE_CONTROL, "no-store")], page).into_response())
}
