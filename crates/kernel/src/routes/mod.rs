//! HTTP route handlers and the application router.

pub mod admin;
pub mod admin_user;
pub mod api;
pub mod api_user;
pub mod auth;
pub mod front;
pub mod health;
pub mod helpers;
pub mod static_files;
pub mod upload;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::negotiate_language;
use crate::state::AppState;

/// Build the complete application.
///
/// Layers run outermost first: trace → compression → CORS → session →
/// language → routes.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>, cors: CorsLayer) -> Router
where
    S: SessionStore + Clone,
{
    Router::new()
        .merge(front::router(state.default_language()))
        .merge(auth::router())
        .merge(admin::router())
        .merge(admin_user::router())
        .merge(api::router())
        .merge(api_user::router())
        .merge(upload::router(state.files().max_size()))
        .merge(health::router())
        .merge(static_files::router())
        .fallback(front::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            negotiate_language,
        ))
        .layer(session_layer)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
