//! Form helpers shared by the admin and login pages.

pub mod csrf;

pub use csrf::{CSRF_FIELD, clear_csrf_tokens, generate_csrf_token, verify_csrf_token};
