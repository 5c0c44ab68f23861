//! Shared route helpers for authentication and page rendering.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use tower_sessions::Session;
use uuid::Uuid;

use crate::content::Language;
use crate::error::{AppError, AppResult};
use crate::form::csrf::verify_csrf_token;
use crate::models::User;
use crate::routes::auth::SESSION_USER_ID;
use crate::state::AppState;

/// The logged-in, active user, if any.
pub async fn current_user(state: &AppState, session: &Session) -> Option<User> {
    let id: Uuid = session.get(SESSION_USER_ID).await.ok().flatten()?;

    match User::find_by_id(state.db(), id).await {
        Ok(user) => user.filter(User::is_active),
        Err(e) => {
            tracing::error!(error = %e, "failed to load session user");
            None
        }
    }
}

/// Require an authenticated user, or redirect to login.
pub async fn require_login(state: &AppState, session: &Session) -> Result<User, Response> {
    current_user(state, session)
        .await
        .ok_or_else(|| Redirect::to("/user/login").into_response())
}

/// Require an authenticated **admin** user, or redirect/reject.
///
/// Redirects to `/user/login` without a valid user, returns 403 for editors.
pub async fn require_admin(state: &AppState, session: &Session) -> Result<User, Response> {
    let user = require_login(state, session).await?;
    if user.is_admin {
        Ok(user)
    } else {
        Err((StatusCode::FORBIDDEN, Html("Access denied")).into_response())
    }
}

/// JSON API variant of [`require_login`]: 401 instead of a redirect.
pub async fn api_login(state: &AppState, session: &Session) -> AppResult<User> {
    current_user(state, session)
        .await
        .ok_or(AppError::Unauthorized)
}

/// JSON API variant of [`require_admin`].
pub async fn api_admin(state: &AppState, session: &Session) -> AppResult<User> {
    let user = api_login(state, session).await?;
    if user.is_admin {
        Ok(user)
    } else {
        Err(AppError::Forbidden)
    }
}

/// Verify a submitted CSRF token, or produce a 403 page.
pub async fn require_csrf(session: &Session, token: &str) -> Result<(), Response> {
    match verify_csrf_token(session, token).await {
        Ok(true) => Ok(()),
        Ok(false) | Err(_) => Err((
            StatusCode::FORBIDDEN,
            Html("Invalid or expired form token. Go back, reload the page, and try again."),
        )
            .into_response()),
    }
}

/// Render a template, falling back to a plain error page.
pub fn render(state: &AppState, template: &str, context: &tera::Context) -> Response {
    render_with_status(state, StatusCode::OK, template, context)
}

/// Render a template with a specific status code.
pub fn render_with_status(
    state: &AppState,
    status: StatusCode,
    template: &str,
    context: &tera::Context,
) -> Response {
    match state.theme().render(template, context) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = ?e, template = %template, "failed to render template");
            render_server_error("The page could not be rendered.")
        }
    }
}

/// Minimal 500 page that does not depend on templates.
pub fn render_server_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!(
            r#"<!DOCTYPE html>
<html><head><title>Error</title></head>
<body><h1>Something went wrong</h1><p>{}</p></body></html>"#,
            html_escape(message)
        )),
    )
        .into_response()
}

/// Path prefix for a language: empty for the default, `/vi` otherwise.
pub fn lang_prefix(lang: Language, default: Language) -> String {
    if lang == default {
        String::new()
    } else {
        format!("/{}", lang.code())
    }
}

/// Whether a redirect target stays on this site.
pub fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// HTML-escape a string for safe output.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
