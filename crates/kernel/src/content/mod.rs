//! Content system: document schema, validation, and storage.
//!
//! Every content type is a [`Document`]; the generic store, validator, and
//! form conversion below serve all of them.

pub mod document;
pub mod filter;
pub mod form;
pub mod localized;
pub mod store;
pub mod validation;

pub use document::{Document, FieldDef, FieldKind, Page, Stored};
pub use filter::FilterPipeline;
pub use localized::{Language, Localized};
pub use store::{DocumentStore, ListQuery, StoreError};
pub use form::{display_value, fill_missing_slug, form_to_json};
pub use validation::{
    FieldError, is_valid_email, is_valid_slug, is_valid_url, parse_document, slugify,
    validate_document,
};
