//! Image uploads and file storage.

pub mod service;
pub mod storage;

pub use service::{ALLOWED_MIME_TYPES, FileService, UploadError, UploadResult, sniff_mime_type};
pub use storage::{FileStorage, LocalFileStorage};
