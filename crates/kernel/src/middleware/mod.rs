//! HTTP middleware components.

pub mod language;

pub use language::{ResolvedLanguage, SESSION_ACTIVE_LANGUAGE, negotiate_language};
