//! JSON REST API for every content type.
//!
//! Each [`Document`] gets the same endpoints under `/api/{collection}`.
//! Reads are public but anonymous callers only see published documents;
//! writes need a logged-in user.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::Value;
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;

use crate::content::store::is_valid_field_name;
use crate::content::{Document, ListQuery, Page, Stored, parse_document};
use crate::error::{AppError, AppResult};
use crate::models::{
    Banner, CaseStudy, Category, Kind, Member, MenuLink, Post, Product, Service, Testimonial,
};
use crate::routes::helpers::{api_login, current_user};
use crate::state::AppState;

/// Create the content API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(document_routes::<Banner>())
        .merge(document_routes::<CaseStudy>())
        .merge(document_routes::<Category>())
        .merge(document_routes::<Kind>())
        .merge(document_routes::<Member>())
        .merge(document_routes::<MenuLink>())
        .merge(document_routes::<Post>())
        .merge(document_routes::<Product>())
        .merge(document_routes::<Service>())
        .merge(document_routes::<Testimonial>())
}

/// CRUD routes for one content type.
pub fn document_routes<D: Document>() -> Router<AppState> {
    let base = format!("/api/{}", D::COLLECTION);
    Router::new()
        .route(&base, get(list::<D>).post(create::<D>))
        .route(
            &format!("{base}/{{id}}"),
            get(read::<D>).put(update::<D>).delete(remove::<D>),
        )
        .route(&format!("{base}/slug/{{slug}}"), get(read_by_slug::<D>))
}

/// Listing query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// `true` limits logged-in callers to published documents.
    pub published: Option<bool>,
    /// Top-level field to filter on, with `value`.
    pub field: Option<String>,
    pub value: Option<String>,
}

impl ListParams {
    fn to_query(&self, anonymous: bool) -> AppResult<ListQuery> {
        let defaults = ListQuery::new();
        let (page, per_page) = (defaults.page, defaults.per_page);
        let mut query = defaults.page(
            self.page.unwrap_or(page),
            self.per_page.unwrap_or(per_page),
        );

        if anonymous || self.published == Some(true) {
            query = query.published_only();
        }

        match (&self.field, &self.value) {
            (Some(field), Some(value)) => {
                if !is_valid_field_name(field) {
                    return Err(AppError::BadRequest(format!("invalid field name '{field}'")));
                }
                query = query.where_field(field.clone(), value.clone());
            }
            (None, None) => {}
            _ => {
                return Err(AppError::BadRequest(
                    "field and value must be given together".to_string(),
                ));
            }
        }

        Ok(query)
    }
}

/// GET /api/{collection}
async fn list<D: Document>(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Page<Stored<D>>>> {
    let anonymous = current_user(&state, &session).await.is_none();
    let query = params.to_query(anonymous)?;
    Ok(Json(state.store().list::<D>(&query).await?))
}

/// Hide unpublished documents from anonymous callers.
async fn visible<D: Document>(
    state: &AppState,
    session: &Session,
    found: Option<Stored<D>>,
) -> AppResult<Stored<D>> {
    let stored = found.ok_or(AppError::NotFound)?;
    if !stored.doc.published() && current_user(state, session).await.is_none() {
        return Err(AppError::NotFound);
    }
    Ok(stored)
}

/// GET /api/{collection}/{id}
async fn read<D: Document>(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Stored<D>>> {
    let found = state.store().get::<D>(id).await?;
    Ok(Json(visible(&state, &session, found).await?))
}

/// GET /api/{collection}/slug/{slug}
async fn read_by_slug<D: Document>(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> AppResult<Json<Stored<D>>> {
    let found = state.store().find_by_slug::<D>(&slug).await?;
    Ok(Json(visible(&state, &session, found).await?))
}

/// POST /api/{collection}
async fn create<D: Document>(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<Value>,
) -> AppResult<Response> {
    let user = api_login(&state, &session).await?;
    let doc: D = parse_document(body).map_err(AppError::Validation)?;

    let stored = state.store().create(doc).await?;
    info!(
        collection = D::COLLECTION,
        id = %stored.id,
        user_id = %user.id,
        "document created"
    );

    Ok((StatusCode::CREATED, Json(stored)).into_response())
}

/// PUT /api/{collection}/{id}
///
/// Replaces the whole document.
async fn update<D: Document>(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> AppResult<Json<Stored<D>>> {
    let user = api_login(&state, &session).await?;
    let doc: D = parse_document(body).map_err(AppError::Validation)?;

    let stored = state
        .store()
        .update(id, doc)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(collection = D::COLLECTION, %id, user_id = %user.id, "document updated");

    Ok(Json(stored))
}

/// DELETE /api/{collection}/{id}
async fn remove<D: Document>(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let user = api_login(&state, &session).await?;

    if !state.store().delete::<D>(id).await? {
        return Err(AppError::NotFound);
    }
    info!(collection = D::COLLECTION, %id, user_id = %user.id, "document deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_listing_is_published_only() {
        let query = ListParams::default().to_query(true).unwrap();
        assert!(query.published_only);

        let query = ListParams::default().to_query(false).unwrap();
        assert!(!query.published_only);

        let params = ListParams {
            published: Some(true),
            ..Default::default()
        };
        assert!(params.to_query(false).unwrap().published_only);
    }

    #[test]
    fn field_filter_needs_both_parts() {
        let params = ListParams {
            field: Some("category".into()),
            ..Default::default()
        };
        assert!(matches!(params.to_query(true), Err(AppError::BadRequest(_))));

        let params = ListParams {
            field: Some("category".into()),
            value: Some("abc".into()),
            ..Default::default()
        };
        let query = params.to_query(true).unwrap();
        assert_eq!(
            query.field_filter,
            Some(("category".to_string(), "abc".to_string()))
        );
    }

    #[test]
    fn field_names_are_checked() {
        let params = ListParams {
            field: Some("x' OR 1=1".into()),
            value: Some("y".into()),
            ..Default::default()
        };
        assert!(matches!(params.to_query(false), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn paging_defaults() {
        let params = ListParams {
            page: Some(3),
            ..Default::default()
        };
        let query = params.to_query(false).unwrap();
        assert_eq!(query.page, 3);
        assert_eq!(query.per_page, crate::content::store::DEFAULT_PER_PAGE);
    }
}
