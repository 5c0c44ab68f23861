//! Admin dashboard and content management pages.
//!
//! Every content type gets the same list, add, edit, and delete pages,
//! rendered from its field schema.

use std::collections::HashMap;

use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_sessions::Session;
use uuid::Uuid;

use crate::content::{
    Document, FieldDef, FieldError, FieldKind, ListQuery, StoreError, display_value, form_to_json,
    parse_document,
};
use crate::form::csrf::{CSRF_FIELD, generate_csrf_token};
use crate::models::{
    Banner, CaseStudy, Category, Kind, Member, MenuLink, Post, Product, Service, Testimonial, User,
};
use crate::routes::helpers::{
    render, render_server_error, render_with_status, require_csrf, require_login,
};
use crate::state::AppState;

/// Rows per admin list page.
pub const ADMIN_PER_PAGE: u32 = 25;

/// Create the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(dashboard))
        .merge(admin_routes::<Banner>())
        .merge(admin_routes::<CaseStudy>())
        .merge(admin_routes::<Category>())
        .merge(admin_routes::<Kind>())
        .merge(admin_routes::<Member>())
        .merge(admin_routes::<MenuLink>())
        .merge(admin_routes::<Post>())
        .merge(admin_routes::<Product>())
        .merge(admin_routes::<Service>())
        .merge(admin_routes::<Testimonial>())
}

/// List, add, edit, and delete pages for one content type.
pub fn admin_routes<D: Document>() -> Router<AppState> {
    let base = format!("/admin/{}", D::COLLECTION);
    Router::new()
        .route(&base, get(list_page::<D>))
        .route(
            &format!("{base}/add"),
            get(add_form::<D>).post(add_submit::<D>),
        )
        .route(
            &format!("{base}/{{id}}/edit"),
            get(edit_form::<D>).post(edit_submit::<D>),
        )
        .route(
            &format!("{base}/{{id}}/delete"),
            get(delete_confirm::<D>).post(delete_submit::<D>),
        )
}

/// Content type entry for navigation and the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct TypeInfo {
    pub collection: &'static str,
    pub label: &'static str,
    pub plural: &'static str,
}

impl TypeInfo {
    fn of<D: Document>() -> Self {
        Self {
            collection: D::COLLECTION,
            label: D::LABEL,
            plural: D::PLURAL,
        }
    }
}

/// Every content type, in admin menu order.
pub fn content_types() -> Vec<TypeInfo> {
    vec![
        TypeInfo::of::<Post>(),
        TypeInfo::of::<Service>(),
        TypeInfo::of::<CaseStudy>(),
        TypeInfo::of::<Member>(),
        TypeInfo::of::<Testimonial>(),
        TypeInfo::of::<Product>(),
        TypeInfo::of::<Banner>(),
        TypeInfo::of::<Category>(),
        TypeInfo::of::<Kind>(),
        TypeInfo::of::<MenuLink>(),
    ]
}

/// Context shared by every admin page.
pub(crate) async fn admin_context(
    state: &AppState,
    session: &Session,
    user: &User,
) -> tera::Context {
    let csrf_token = generate_csrf_token(session).await.unwrap_or_default();

    let mut context = tera::Context::new();
    context.insert("site_name", state.site_name());
    context.insert("user", user);
    context.insert("types", &content_types());
    context.insert("csrf_token", &csrf_token);
    context.insert("csrf_field", CSRF_FIELD);
    context
}

#[derive(Debug, Serialize)]
struct DashboardEntry {
    #[serde(flatten)]
    info: TypeInfo,
    count: i64,
}

/// GET /admin
async fn dashboard(State(state): State<AppState>, session: Session) -> Response {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let mut entries = Vec::new();
    for info in content_types() {
        let count = match state.store().count(info.collection).await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(error = %e, collection = info.collection, "failed to count");
                return render_server_error("Failed to load the dashboard.");
            }
        };
        entries.push(DashboardEntry { info, count });
    }

    let user_count = if user.is_admin {
        User::count(state.db()).await.ok()
    } else {
        None
    };

    let mut context = admin_context(&state, &session, &user).await;
    context.insert("entries", &entries);
    context.insert("user_count", &user_count);
    context.insert("path", "/admin");

    render(&state, "admin/dashboard.html", &context)
}

#[derive(Debug, Default, Deserialize)]
struct PageParam {
    page: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ListRow {
    id: Uuid,
    title: String,
    slug: Option<String>,
    published: bool,
    weight: i32,
    changed: i64,
}

/// GET /admin/{collection}
async fn list_page<D: Document>(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<PageParam>,
) -> Response {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let query = ListQuery::new().page(params.page.unwrap_or(1), ADMIN_PER_PAGE);
    let page = match state.store().list::<D>(&query).await {
        Ok(page) => page,
        Err(e) => {
            tracing::error!(error = %e, collection = D::COLLECTION, "failed to list documents");
            return render_server_error("Failed to load the list.");
        }
    };

    let total_pages = page.total_pages();
    let page = page.map(|stored| ListRow {
        id: stored.id,
        title: stored.doc.title(),
        slug: stored.doc.slug().map(str::to_string),
        published: stored.doc.published(),
        weight: stored.doc.weight(),
        changed: stored.changed,
    });

    let mut context = admin_context(&state, &session, &user).await;
    context.insert("type", &TypeInfo::of::<D>());
    context.insert("rows", &page.items);
    context.insert("page", &page.page);
    context.insert("total", &page.total);
    context.insert("total_pages", &total_pages);
    context.insert("path", &format!("/admin/{}", D::COLLECTION));

    render(&state, "admin/list.html", &context)
}

/// One selectable reference target.
#[derive(Debug, Serialize)]
struct OptionView {
    value: String,
    label: String,
    selected: bool,
}

/// Everything the form template needs to draw one field.
#[derive(Debug, Serialize)]
struct FieldView {
    name: &'static str,
    label: &'static str,
    widget: &'static str,
    required: bool,
    localized: bool,
    value: String,
    value_en: String,
    value_vi: String,
    checked: bool,
    min: Option<i64>,
    max: Option<i64>,
    options: Vec<OptionView>,
    errors: Vec<String>,
}

/// Messages for one field, including its `.en` / `.vi` parts.
fn errors_for(name: &str, errors: &[FieldError]) -> Vec<String> {
    errors
        .iter()
        .filter(|e| {
            e.field == name
                || e.field
                    .strip_prefix(name)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
        .map(|e| e.message.clone())
        .collect()
}

/// Build field views from a (possibly invalid) document value.
async fn field_views(
    state: &AppState,
    fields: &[FieldDef],
    doc: &Value,
    errors: &[FieldError],
    own_id: Option<Uuid>,
) -> Result<Vec<FieldView>, StoreError> {
    let mut views = Vec::with_capacity(fields.len());

    for field in fields {
        let value = display_value(field, doc, None);
        let (min, max) = match field.kind {
            FieldKind::Integer { min, max } => (Some(min), Some(max)),
            _ => (None, None),
        };

        let options = match field.kind {
            FieldKind::Reference {
                collection,
                label_field,
            } => state
                .store()
                .options(collection, label_field)
                .await?
                .into_iter()
                .filter(|(id, _)| Some(*id) != own_id)
                .map(|(id, label)| {
                    let id = id.to_string();
                    OptionView {
                        selected: id == value,
                        value: id,
                        label,
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        views.push(FieldView {
            name: field.name,
            label: field.label,
            widget: field.kind.widget(),
            required: field.required,
            localized: field.kind.is_localized(),
            value_en: display_value(field, doc, Some("en")),
            value_vi: display_value(field, doc, Some("vi")),
            checked: doc.get(field.name).and_then(Value::as_bool).unwrap_or(false),
            value,
            min,
            max,
            options,
            errors: errors_for(field.name, errors),
        });
    }

    Ok(views)
}

/// Errors not tied to a schema field.
fn form_errors(fields: &[FieldDef], errors: &[FieldError]) -> Vec<String> {
    errors
        .iter()
        .filter(|e| {
            !fields
                .iter()
                .any(|f| !errors_for(f.name, std::slice::from_ref(e)).is_empty())
        })
        .map(|e| e.message.clone())
        .collect()
}

/// Render the add/edit form.
#[allow(clippy::too_many_arguments)]
async fn render_form<D: Document>(
    state: &AppState,
    session: &Session,
    user: &User,
    status: StatusCode,
    doc: &Value,
    errors: &[FieldError],
    id: Option<Uuid>,
) -> Response {
    let fields = match field_views(state, D::fields(), doc, errors, id).await {
        Ok(fields) => fields,
        Err(e) => {
            tracing::error!(error = %e, collection = D::COLLECTION, "failed to build form");
            return render_server_error("Failed to build the form.");
        }
    };

    let action = match id {
        Some(id) => format!("/admin/{}/{id}/edit", D::COLLECTION),
        None => format!("/admin/{}/add", D::COLLECTION),
    };

    let mut context = admin_context(state, session, user).await;
    context.insert("type", &TypeInfo::of::<D>());
    context.insert("fields", &fields);
    context.insert("errors", &form_errors(D::fields(), errors));
    context.insert("editing", &id.is_some());
    context.insert("id", &id);
    context.insert("action", &action);
    context.insert("path", &action);

    render_with_status(state, status, "admin/form.html", &context)
}

/// Starting values for a new document: checkboxes on.
fn blank_document(fields: &[FieldDef]) -> Value {
    let defaults = fields
        .iter()
        .filter(|f| f.kind == FieldKind::Bool)
        .map(|f| (f.name.to_string(), Value::Bool(true)))
        .collect();
    Value::Object(defaults)
}

/// Form body: raw pairs, converted through the schema.
type FormPairs = Vec<(String, String)>;

fn submitted_token(pairs: &FormPairs) -> &str {
    pairs
        .iter()
        .find(|(k, _)| k == CSRF_FIELD)
        .map(|(_, v)| v.as_str())
        .unwrap_or_default()
}

/// Turn a store rejection into a form error where one fits.
fn store_error_to_field(err: StoreError, fields: &[FieldDef]) -> Result<FieldError, StoreError> {
    match err {
        StoreError::SlugTaken(slug) => {
            let name = fields
                .iter()
                .find(|f| f.kind == FieldKind::Slug)
                .map_or("slug", |f| f.name);
            Ok(FieldError::new(
                name,
                format!("The slug '{slug}' is already in use."),
            ))
        }
        StoreError::MissingReference { field, .. } => Ok(FieldError::new(
            field,
            "The selected item no longer exists.",
        )),
        other => Err(other),
    }
}

/// GET /admin/{collection}/add
async fn add_form<D: Document>(State(state): State<AppState>, session: Session) -> Response {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let doc = blank_document(D::fields());
    render_form::<D>(&state, &session, &user, StatusCode::OK, &doc, &[], None).await
}

/// POST /admin/{collection}/add
async fn add_submit<D: Document>(
    State(state): State<AppState>,
    session: Session,
    Form(pairs): Form<FormPairs>,
) -> Response {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    if let Err(resp) = require_csrf(&session, submitted_token(&pairs)).await {
        return resp;
    }

    let submitted = form_to_json(D::fields(), &pairs);
    let doc: D = match parse_document(submitted.clone()) {
        Ok(doc) => doc,
        Err(errors) => {
            return render_form::<D>(
                &state,
                &session,
                &user,
                StatusCode::UNPROCESSABLE_ENTITY,
                &submitted,
                &errors,
                None,
            )
            .await;
        }
    };

    match state.store().create(doc).await {
        Ok(stored) => {
            tracing::info!(
                collection = D::COLLECTION,
                id = %stored.id,
                user_id = %user.id,
                "document created"
            );
            Redirect::to(&format!("/admin/{}", D::COLLECTION)).into_response()
        }
        Err(e) => match store_error_to_field(e, D::fields()) {
            Ok(error) => {
                render_form::<D>(
                    &state,
                    &session,
                    &user,
                    StatusCode::UNPROCESSABLE_ENTITY,
                    &submitted,
                    &[error],
                    None,
                )
                .await
            }
            Err(e) => {
                tracing::error!(error = %e, collection = D::COLLECTION, "failed to create document");
                render_server_error("Failed to save.")
            }
        },
    }
}

/// GET /admin/{collection}/{id}/edit
async fn edit_form<D: Document>(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Response {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let stored = match state.store().get::<D>(id).await {
        Ok(Some(stored)) => stored,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!(error = %e, %id, "failed to load document");
            return render_server_error("Failed to load the document.");
        }
    };

    let doc = serde_json::to_value(&stored.doc).unwrap_or_else(|_| json!({}));
    render_form::<D>(&state, &session, &user, StatusCode::OK, &doc, &[], Some(id)).await
}

/// POST /admin/{collection}/{id}/edit
async fn edit_submit<D: Document>(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Form(pairs): Form<FormPairs>,
) -> Response {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    if let Err(resp) = require_csrf(&session, submitted_token(&pairs)).await {
        return resp;
    }

    let submitted = form_to_json(D::fields(), &pairs);
    let doc: D = match parse_document(submitted.clone()) {
        Ok(doc) => doc,
        Err(errors) => {
            return render_form::<D>(
                &state,
                &session,
                &user,
                StatusCode::UNPROCESSABLE_ENTITY,
                &submitted,
                &errors,
                Some(id),
            )
            .await;
        }
    };

    match state.store().update(id, doc).await {
        Ok(Some(_)) => {
            tracing::info!(collection = D::COLLECTION, %id, user_id = %user.id, "document updated");
            Redirect::to(&format!("/admin/{}", D::COLLECTION)).into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => match store_error_to_field(e, D::fields()) {
            Ok(error) => {
                render_form::<D>(
                    &state,
                    &session,
                    &user,
                    StatusCode::UNPROCESSABLE_ENTITY,
                    &submitted,
                    &[error],
                    Some(id),
                )
                .await
            }
            Err(e) => {
                tracing::error!(error = %e, %id, "failed to update document");
                render_server_error("Failed to save.")
            }
        },
    }
}

/// GET /admin/{collection}/{id}/delete
async fn delete_confirm<D: Document>(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Response {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let stored = match state.store().get::<D>(id).await {
        Ok(Some(stored)) => stored,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!(error = %e, %id, "failed to load document");
            return render_server_error("Failed to load the document.");
        }
    };

    let mut context = admin_context(&state, &session, &user).await;
    context.insert("type", &TypeInfo::of::<D>());
    context.insert("id", &id);
    context.insert("title", &stored.doc.title());
    context.insert("action", &format!("/admin/{}/{id}/delete", D::COLLECTION));
    context.insert("cancel", &format!("/admin/{}", D::COLLECTION));
    context.insert("path", &format!("/admin/{}", D::COLLECTION));

    render(&state, "admin/delete.html", &context)
}

/// POST /admin/{collection}/{id}/delete
async fn delete_submit<D: Document>(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let user = match require_login(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    let token = form.get(CSRF_FIELD).map(String::as_str).unwrap_or_default();
    if let Err(resp) = require_csrf(&session, token).await {
        return resp;
    }

    match state.store().delete::<D>(id).await {
        Ok(true) => {
            tracing::info!(collection = D::COLLECTION, %id, user_id = %user.id, "document deleted");
            Redirect::to(&format!("/admin/{}", D::COLLECTION)).into_response()
        }
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!(error = %e, %id, "failed to delete document");
            render_server_error("Failed to delete.")
        }
    }
}
