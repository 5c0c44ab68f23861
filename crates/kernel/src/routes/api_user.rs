//! User account API (admin only).

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;

use crate::content::store::{DEFAULT_PER_PAGE, MAX_PER_PAGE};
use crate::error::{AppError, AppResult};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::routes::helpers::api_admin;
use crate::state::AppState;

/// Create the user API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[derive(Debug, Default, Deserialize)]
struct PageParams {
    page: Option<u32>,
    per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
struct UserPage {
    items: Vec<User>,
    total: i64,
    page: u32,
    per_page: u32,
}

/// Reject a name or email already used by another account.
pub(crate) async fn check_unique(
    state: &AppState,
    name: Option<&str>,
    mail: Option<&str>,
    own_id: Option<Uuid>,
) -> AppResult<()> {
    let other = |user: &User| Some(user.id) != own_id;

    if let Some(name) = name
        && User::find_by_name(state.db(), name.trim())
            .await?
            .is_some_and(|u| other(&u))
    {
        return Err(AppError::Conflict(format!("username '{}' is taken", name.trim())));
    }
    if let Some(mail) = mail
        && User::find_by_mail(state.db(), mail.trim())
            .await?
            .is_some_and(|u| other(&u))
    {
        return Err(AppError::Conflict(format!(
            "email '{}' is already registered",
            mail.trim()
        )));
    }
    Ok(())
}

/// GET /api/users
async fn list_users(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<PageParams>,
) -> AppResult<Json<UserPage>> {
    api_admin(&state, &session).await?;

    let page = params.page.unwrap_or(1).max(1);
    let per_page = params
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    let offset = i64::from(page - 1) * i64::from(per_page);

    let items = User::list(state.db(), i64::from(per_page), offset).await?;
    let total = User::count(state.db()).await?;

    Ok(Json(UserPage {
        items,
        total,
        page,
        per_page,
    }))
}

/// GET /api/users/{id}
async fn get_user(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Json<User>> {
    api_admin(&state, &session).await?;
    let user = User::find_by_id(state.db(), id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(user))
}

/// POST /api/users
async fn create_user(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let admin = api_admin(&state, &session).await?;

    let errors = input.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    check_unique(&state, Some(&input.name), Some(&input.mail), None).await?;

    let user = User::create(state.db(), input).await?;
    info!(user_id = %user.id, admin_id = %admin.id, "user created");

    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users/{id}
async fn update_user(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUser>,
) -> AppResult<Json<User>> {
    let admin = api_admin(&state, &session).await?;

    let errors = input.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    if id == admin.id && (input.is_admin == Some(false) || input.status == Some(0)) {
        return Err(AppError::BadRequest(
            "you cannot demote or block your own account".to_string(),
        ));
    }
    check_unique(&state, input.name.as_deref(), input.mail.as_deref(), Some(id)).await?;

    let user = User::update(state.db(), id, &input)
        .await?
        .ok_or(AppError::NotFound)?;

    info!(user_id = %id, admin_id = %admin.id, "user updated");
    Ok(Json(user))
}

/// DELETE /api/users/{id}
async fn delete_user(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let admin = api_admin(&state, &session).await?;

    if id == admin.id {
        return Err(AppError::BadRequest(
            "you cannot delete your own account".to_string(),
        ));
    }
    if !User::delete(state.db(), id).await? {
        return Err(AppError::NotFound);
    }

    info!(user_id = %id, admin_id = %admin.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
