//! Image upload and uploaded file serving.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::file::{UploadResult, sniff_mime_type};
use crate::routes::helpers::api_login;
use crate::routes::static_files::mime_from_path;
use crate::state::AppState;

/// Multipart framing allowance on top of the file size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the upload router; request bodies are capped near `max_upload_size`.
pub fn router(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/api/uploads",
            post(upload).layer(DefaultBodyLimit::max(
                max_upload_size.saturating_add(MULTIPART_OVERHEAD),
            )),
        )
        .route("/files/{*path}", get(serve_file))
}

/// Upload an image.
///
/// POST /api/uploads
/// Content-Type: multipart/form-data, field `file`.
async fn upload(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadResult>)> {
    let user = api_login(&state, &session).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let data = field.bytes().await.map_err(|e| {
            warn!(error = %e, "failed to read upload data");
            AppError::BadRequest("failed to read file data".to_string())
        })?;

        let result = state.files().upload(&filename, &data).await?;
        tracing::info!(user_id = %user.id, url = %result.url, "image uploaded");
        return Ok((StatusCode::CREATED, Json(result)));
    }

    Err(AppError::BadRequest("no file provided".to_string()))
}

/// Serve an uploaded file.
///
/// GET /files/{*path}
async fn serve_file(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    let uri = format!("local://{}", path.trim_start_matches('/'));
    let storage = state.files().storage();

    match storage.exists(&uri).await {
        Ok(true) => {}
        _ => return StatusCode::NOT_FOUND.into_response(),
    }

    let data = match storage.read(&uri).await {
        Ok(data) => data,
        Err(e) => {
            warn!(error = %e, uri = %uri, "failed to read uploaded file");
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    let content_type = sniff_mime_type(&data)
        .unwrap_or_else(|| mime_from_path(std::path::Path::new(&path)));

    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=604800"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            // Uploaded SVG must not run scripts.
            (header::CONTENT_SECURITY_POLICY, "default-src 'none'; style-src 'unsafe-inline'"),
        ],
        data,
    )
        .into_response()
}
