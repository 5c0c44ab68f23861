//! Image upload service: validation, type sniffing, and storage.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::storage::FileStorage;

/// MIME types accepted for upload.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

/// Upload failure.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no file provided")]
    Empty,

    #[error("file too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("file type not allowed: {0}")]
    UnsupportedType(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Result of a stored upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    pub filename: String,
    pub uri: String,
    /// Public URL, suitable for image fields.
    pub url: String,
    pub size: usize,
    pub mime_type: String,
}

/// Accepts uploads and writes them to a [`FileStorage`].
pub struct FileService {
    storage: Arc<dyn FileStorage>,
    max_size: usize,
}

impl FileService {
    pub fn new(storage: Arc<dyn FileStorage>, max_size: usize) -> Self {
        Self { storage, max_size }
    }

    /// Validate and store an uploaded image.
    ///
    /// The MIME type is sniffed from the content; the client's declared type
    /// is ignored.
    pub async fn upload(&self, filename: &str, data: &[u8]) -> Result<UploadResult, UploadError> {
        if data.is_empty() {
            return Err(UploadError::Empty);
        }
        if data.len() > self.max_size {
            return Err(UploadError::TooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let mime_type = sniff_mime_type(data)
            .filter(|m| ALLOWED_MIME_TYPES.contains(m))
            .ok_or_else(|| {
                UploadError::UnsupportedType(
                    sniff_mime_type(data)
                        .unwrap_or("application/octet-stream")
                        .to_string(),
                )
            })?;

        let uri = self.storage.generate_uri(filename);
        self.storage.write(&uri, data).await?;
        let url = self.storage.public_url(&uri);

        info!(
            filename = %filename,
            uri = %uri,
            size = data.len(),
            mime = mime_type,
            "file uploaded"
        );

        Ok(UploadResult {
            filename: filename.to_string(),
            uri,
            url,
            size: data.len(),
            mime_type: mime_type.to_string(),
        })
    }

    pub fn storage(&self) -> &Arc<dyn FileStorage> {
        &self.storage
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl std::fmt::Debug for FileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileService")
            .field("scheme", &self.storage.scheme())
            .field("max_size", &self.max_size)
            .finish()
    }
}

/// Detect a file's MIME type from its content.
///
/// SVG is text, so it is recognised by its root element.
pub fn sniff_mime_type(data: &[u8]) -> Option<&'static str> {
    if let Some(kind) = infer::get(data) {
        return Some(kind.mime_type());
    }
    looks_like_svg(data).then_some("image/svg+xml")
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(1024)];
    // The cut may split a multibyte character; keep the valid prefix.
    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return false,
    };
    let text = text.trim_start_matches('\u{feff}').trim_start();
    (text.starts_with("<?xml") || text.starts_with("<svg") || text.starts_with("<!--"))
        && text.contains("<svg")
}
