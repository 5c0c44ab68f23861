//! Admin pages for user accounts.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use uuid::Uuid;

use crate::content::{FieldError, Language};
use crate::models::{CreateUser, UpdateUser, User};
use crate::state::AppState;

use super::admin::{ADMIN_PER_PAGE, admin_context};
use super::helpers::{render, render_server_error, render_with_status, require_admin, require_csrf};

/// Create the user admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/add", get(add_user_form).post(add_user_submit))
        .route(
            "/admin/users/{id}/edit",
            get(edit_user_form).post(edit_user_submit),
        )
        .route(
            "/admin/users/{id}/delete",
            get(delete_user_confirm).post(delete_user_submit),
        )
}

/// User form data.
#[derive(Debug, Deserialize)]
struct UserFormData {
    #[serde(rename = "_token")]
    token: String,
    name: String,
    mail: String,
    password: Option<String>,
    is_admin: Option<String>,
    status: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CsrfOnlyForm {
    #[serde(rename = "_token")]
    token: String,
}

#[derive(Debug, Default, Deserialize)]
struct PageParam {
    page: Option<u32>,
}

/// Values echoed back into the form.
#[derive(Debug, Serialize)]
struct FormValues {
    name: String,
    mail: String,
    is_admin: bool,
    status: bool,
    language: String,
}

impl From<&UserFormData> for FormValues {
    fn from(form: &UserFormData) -> Self {
        Self {
            name: form.name.clone(),
            mail: form.mail.clone(),
            is_admin: form.is_admin.is_some(),
            status: form.status.is_some(),
            language: form.language.clone().unwrap_or_default(),
        }
    }
}

impl From<&User> for FormValues {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            mail: user.mail.clone(),
            is_admin: user.is_admin,
            status: user.is_active(),
            language: user.language.clone().unwrap_or_default(),
        }
    }
}

fn languages() -> serde_json::Value {
    Language::ALL
        .iter()
        .map(|lang| json!({"code": lang.code(), "name": lang.native_name()}))
        .collect()
}

/// Render the add/edit user form.
async fn render_user_form(
    state: &AppState,
    session: &Session,
    admin: &User,
    status: StatusCode,
    values: &FormValues,
    errors: &[FieldError],
    user_id: Option<Uuid>,
) -> Response {
    let action = match user_id {
        Some(id) => format!("/admin/users/{id}/edit"),
        None => "/admin/users/add".to_string(),
    };

    let mut context = admin_context(state, session, admin).await;
    context.insert("action", &action);
    context.insert("editing", &user_id.is_some());
    context.insert("user_id", &user_id);
    context.insert("values", values);
    context.insert("errors", errors);
    context.insert("languages", &languages());
    context.insert("path", "/admin/users");

    render_with_status(state, status, "admin/user-form.html", &context)
}

/// Field errors for name/mail conflicts with other accounts.
async fn uniqueness_errors(
    state: &AppState,
    name: &str,
    mail: &str,
    own_id: Option<Uuid>,
) -> anyhow::Result<Vec<FieldError>> {
    let mut errors = Vec::new();
    let other = |user: &User| Some(user.id) != own_id;

    if User::find_by_name(state.db(), name.trim())
        .await?
        .is_some_and(|u| other(&u))
    {
        errors.push(FieldError::new(
            "name",
            format!("Username '{}' is already taken.", name.trim()),
        ));
    }
    if User::find_by_mail(state.db(), mail.trim())
        .await?
        .is_some_and(|u| other(&u))
    {
        errors.push(FieldError::new(
            "mail",
            format!("Email '{}' is already in use.", mail.trim()),
        ));
    }
    Ok(errors)
}

/// GET /admin/users
async fn list_users(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<PageParam>,
) -> Response {
    let admin = match require_admin(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let page = params.page.unwrap_or(1).max(1);
    let offset = i64::from(page - 1) * i64::from(ADMIN_PER_PAGE);

    let (users, total) = match tokio::try_join!(
        User::list(state.db(), i64::from(ADMIN_PER_PAGE), offset),
        User::count(state.db()),
    ) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "failed to list users");
            return render_server_error("Failed to load users.");
        }
    };
    let total_pages = (total.max(0) as u64).div_ceil(u64::from(ADMIN_PER_PAGE)).max(1);

    let mut context = admin_context(&state, &session, &admin).await;
    context.insert("users", &users);
    context.insert("page", &page);
    context.insert("total", &total);
    context.insert("total_pages", &total_pages);
    context.insert("path", "/admin/users");

    render(&state, "admin/users.html", &context)
}

/// GET /admin/users/add
async fn add_user_form(State(state): State<AppState>, session: Session) -> Response {
    let admin = match require_admin(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let values = FormValues {
        name: String::new(),
        mail: String::new(),
        is_admin: false,
        status: true,
        language: String::new(),
    };
    render_user_form(&state, &session, &admin, StatusCode::OK, &values, &[], None).await
}

/// POST /admin/users/add
async fn add_user_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UserFormData>,
) -> Response {
    let admin = match require_admin(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    if let Err(resp) = require_csrf(&session, &form.token).await {
        return resp;
    }

    let input = CreateUser {
        name: form.name.clone(),
        password: form.password.clone().unwrap_or_default(),
        mail: form.mail.clone(),
        is_admin: form.is_admin.is_some(),
    };

    let mut errors = input.validate();
    match uniqueness_errors(&state, &form.name, &form.mail, None).await {
        Ok(found) => errors.extend(found),
        Err(e) => {
            tracing::error!(error = %e, "failed to check user uniqueness");
            return render_server_error("Failed to create user.");
        }
    }
    if !errors.is_empty() {
        return render_user_form(
            &state,
            &session,
            &admin,
            StatusCode::UNPROCESSABLE_ENTITY,
            &FormValues::from(&form),
            &errors,
            None,
        )
        .await;
    }

    let user = match User::create(state.db(), input).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(error = %e, "failed to create user");
            return render_server_error("Failed to create user.");
        }
    };

    // Status and language are not part of account creation.
    let extra = UpdateUser {
        status: Some(i16::from(form.status.is_some())),
        language: form.language.clone().filter(|l| !l.is_empty()),
        ..Default::default()
    };
    if let Err(e) = User::update(state.db(), user.id, &extra).await {
        tracing::error!(error = %e, user_id = %user.id, "failed to set user status");
    }

    tracing::info!(user_id = %user.id, admin_id = %admin.id, name = %user.name, "user created");
    Redirect::to("/admin/users").into_response()
}

/// GET /admin/users/{id}/edit
async fn edit_user_form(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<Uuid>,
) -> Response {
    let admin = match require_admin(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let Some(user) = User::find_by_id(state.db(), user_id).await.ok().flatten() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    render_user_form(
        &state,
        &session,
        &admin,
        StatusCode::OK,
        &FormValues::from(&user),
        &[],
        Some(user_id),
    )
    .await
}

/// POST /admin/users/{id}/edit
async fn edit_user_submit(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<Uuid>,
    Form(form): Form<UserFormData>,
) -> Response {
    let admin = match require_admin(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    if let Err(resp) = require_csrf(&session, &form.token).await {
        return resp;
    }

    let input = UpdateUser {
        name: Some(form.name.clone()),
        mail: Some(form.mail.clone()),
        is_admin: Some(form.is_admin.is_some()),
        status: Some(i16::from(form.status.is_some())),
        language: form.language.clone().filter(|l| !l.is_empty()),
        password: form.password.clone().filter(|p| !p.is_empty()),
    };

    let mut errors = input.validate();
    if user_id == admin.id && !(form.is_admin.is_some() && form.status.is_some()) {
        errors.push(FieldError::new(
            "is_admin",
            "You cannot demote or block your own account.",
        ));
    }
    match uniqueness_errors(&state, &form.name, &form.mail, Some(user_id)).await {
        Ok(found) => errors.extend(found),
        Err(e) => {
            tracing::error!(error = %e, "failed to check user uniqueness");
            return render_server_error("Failed to update user.");
        }
    }
    if !errors.is_empty() {
        return render_user_form(
            &state,
            &session,
            &admin,
            StatusCode::UNPROCESSABLE_ENTITY,
            &FormValues::from(&form),
            &errors,
            Some(user_id),
        )
        .await;
    }

    match User::update(state.db(), user_id, &input).await {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!(error = %e, %user_id, "failed to update user");
            return render_server_error("Failed to update user.");
        }
    }

    tracing::info!(%user_id, admin_id = %admin.id, "user updated");
    Redirect::to("/admin/users").into_response()
}

/// GET /admin/users/{id}/delete
async fn delete_user_confirm(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<Uuid>,
) -> Response {
    let admin = match require_admin(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    if user_id == admin.id {
        return (StatusCode::BAD_REQUEST, "You cannot delete your own account.").into_response();
    }

    let Some(user) = User::find_by_id(state.db(), user_id).await.ok().flatten() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mut context = admin_context(&state, &session, &admin).await;
    context.insert("type", &json!({"label": "User", "plural": "Users", "collection": "users"}));
    context.insert("id", &user_id);
    context.insert("title", &user.name);
    context.insert("action", &format!("/admin/users/{user_id}/delete"));
    context.insert("cancel", "/admin/users");
    context.insert("path", "/admin/users");

    render(&state, "admin/delete.html", &context)
}

/// POST /admin/users/{id}/delete
async fn delete_user_submit(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<Uuid>,
    Form(form): Form<CsrfOnlyForm>,
) -> Response {
    let admin = match require_admin(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    if let Err(resp) = require_csrf(&session, &form.token).await {
        return resp;
    }
    if user_id == admin.id {
        return (StatusCode::BAD_REQUEST, "You cannot delete your own account.").into_response();
    }

    match User::delete(state.db(), user_id).await {
        Ok(true) => {
            tracing::info!(%user_id, admin_id = %admin.id, "user deleted");
            Redirect::to("/admin/users").into_response()
        }
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!(error = %e, %user_id, "failed to delete user");
            render_server_error("Failed to delete user.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_values_follow_checkboxes() {
        let form = UserFormData {
            token: "t".into(),
            name: "lan".into(),
            mail: "lan@example.com".into(),
            password: None,
            is_admin: None,
            status: Some("on".into()),
            language: Some("vi".into()),
        };
        let values = FormValues::from(&form);
        assert!(!values.is_admin);
        assert!(values.status);
        assert_eq!(values.language, "vi");
    }

    #[test]
    fn language_choices_cover_both_languages() {
        let langs = languages();
        let codes: Vec<_> = langs
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|l| l["code"].as_str())
            .collect();
        assert_eq!(codes, ["en", "vi"]);
    }
}
