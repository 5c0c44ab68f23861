//! Theme engine and template rendering.
//!
//! Provides Tera-based template rendering with filters for bilingual
//! values, Markdown bodies, and dates.

mod engine;

pub use engine::ThemeEngine;
