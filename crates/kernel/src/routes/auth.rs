//! Authentication routes (login, logout, current user).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::form::csrf::{clear_csrf_tokens, generate_csrf_token};
use crate::models::User;
use crate::routes::helpers::{api_login, render, render_with_status, require_csrf};
use crate::state::AppState;

/// Session key for storing the authenticated user ID.
pub const SESSION_USER_ID: &str = "user_id";

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
}

/// Typed login error for explicit status code mapping.
#[derive(Debug)]
enum LoginError {
    /// Wrong username or password, or a blocked account (401).
    InvalidCredentials,
    /// Database or session failure (500).
    Internal,
}

impl LoginError {
    fn message(&self) -> &'static str {
        match self {
            LoginError::InvalidCredentials => "Invalid username or password",
            LoginError::Internal => "Internal server error",
        }
    }
}

impl From<LoginError> for AppError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::InvalidCredentials => AppError::Unauthorized,
            LoginError::Internal => AppError::Internal(anyhow::anyhow!("login failed")),
        }
    }
}

/// Login form handler.
///
/// GET /user/login
async fn login_form(State(state): State<AppState>, session: Session) -> Response {
    render_login(&state, &session, None).await
}

/// Render the login form, optionally with an error.
async fn render_login(state: &AppState, session: &Session, error: Option<&str>) -> Response {
    let csrf_token = generate_csrf_token(session).await.unwrap_or_default();

    let mut context = tera::Context::new();
    context.insert("site_name", state.site_name());
    context.insert("csrf_token", &csrf_token);
    if let Some(error) = error {
        context.insert("error", error);
        return render_with_status(state, StatusCode::UNAUTHORIZED, "user/login.html", &context);
    }

    render(state, "user/login.html", &context)
}

/// Form-based login request.
#[derive(Debug, Deserialize)]
pub struct LoginFormRequest {
    pub username: String,
    pub password: String,
    #[serde(rename = "_token", default)]
    pub csrf_token: String,
}

/// Form-based login handler.
///
/// POST /user/login (form data)
async fn login_form_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginFormRequest>,
) -> Response {
    if let Err(resp) = require_csrf(&session, &form.csrf_token).await {
        return resp;
    }

    let request = LoginRequest {
        username: form.username,
        password: form.password,
    };

    match do_login(&state, &session, &request).await {
        Ok(_) => Redirect::to("/admin").into_response(),
        Err(e) => render_login(&state, &session, Some(e.message())).await,
    }
}

/// Check credentials and start an authenticated session.
async fn do_login(
    state: &AppState,
    session: &Session,
    request: &LoginRequest,
) -> Result<User, LoginError> {
    let user = match User::find_by_name(state.db(), request.username.trim()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            info!(username = %request.username, "login failed: unknown user");
            return Err(LoginError::InvalidCredentials);
        }
        Err(e) => {
            tracing::error!(error = %e, "database error during login");
            return Err(LoginError::Internal);
        }
    };

    if !user.is_active() || !user.verify_password(&request.password) {
        info!(user_id = %user.id, "login failed: bad password or blocked account");
        return Err(LoginError::InvalidCredentials);
    }

    // New session id on privilege change.
    session.cycle_id().await.map_err(|e| {
        tracing::error!(error = %e, "failed to cycle session id");
        LoginError::Internal
    })?;

    session.insert(SESSION_USER_ID, user.id).await.map_err(|e| {
        tracing::error!(error = %e, "failed to insert user_id into session");
        LoginError::Internal
    })?;

    if let Err(e) = User::touch_login(state.db(), user.id).await {
        tracing::warn!(error = %e, user_id = %user.id, "failed to update login timestamp");
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

/// JSON login handler.
///
/// POST /api/auth/login
async fn api_login_submit(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<User>> {
    let user = do_login(&state, &session, &request).await?;
    Ok(Json(user))
}

/// End the session.
async fn end_session(session: &Session) -> AppResult<()> {
    let user_id: Option<uuid::Uuid> = session.get(SESSION_USER_ID).await.ok().flatten();

    if let Err(e) = clear_csrf_tokens(session).await {
        tracing::warn!(error = %e, "failed to clear CSRF tokens");
    }
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to delete session: {e}")))?;

    if let Some(user_id) = user_id {
        info!(%user_id, "user logged out");
    }
    Ok(())
}

/// Form logout token.
#[derive(Debug, Deserialize)]
pub struct LogoutForm {
    #[serde(rename = "_token", default)]
    pub csrf_token: String,
}

/// POST /user/logout
async fn logout_form(session: Session, Form(form): Form<LogoutForm>) -> Response {
    if let Err(resp) = require_csrf(&session, &form.csrf_token).await {
        return resp;
    }
    match end_session(&session).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /api/auth/logout
async fn api_logout(session: Session) -> AppResult<Json<LoginResponse>> {
    end_session(&session).await?;
    Ok(Json(LoginResponse {
        success: true,
        message: "Logout successful".to_string(),
    }))
}

/// GET /api/auth/me
async fn me(State(state): State<AppState>, session: Session) -> AppResult<Json<User>> {
    Ok(Json(api_login(&state, &session).await?))
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/login", get(login_form).post(login_form_submit))
        .route("/user/logout", post(logout_form))
        .route("/api/auth/login", post(api_login_submit))
        .route("/api/auth/logout", post(api_logout))
        .route("/api/auth/me", get(me))
}
