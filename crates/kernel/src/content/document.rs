//! Document trait and field schema shared by every content type.
//!
//! A content type is a serde struct plus a static field schema. The schema
//! drives validation, admin form rendering, and form-to-JSON conversion, so
//! adding a content type never requires new handlers.

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Kind of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line plain text.
    Text,
    /// Multi-line plain text.
    TextArea,
    /// Bilingual single-line text.
    Localized,
    /// Bilingual multi-line text.
    LocalizedText,
    /// Bilingual Markdown body.
    LocalizedMarkdown,
    /// URL path segment (`lower-case-words`).
    Slug,
    /// Absolute http(s) URL or site-relative path.
    Url,
    /// Image URL, usually produced by the upload endpoint.
    Image,
    /// Email address.
    Email,
    /// Bounded integer.
    Integer { min: i64, max: i64 },
    /// Checkbox.
    Bool,
    /// List of short strings, entered comma separated.
    Tags,
    /// UUID of a document in another collection.
    Reference {
        collection: &'static str,
        label_field: &'static str,
    },
}

impl FieldKind {
    /// Widget name used by the admin form template.
    pub fn widget(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::TextArea => "textarea",
            FieldKind::Localized => "localized",
            FieldKind::LocalizedText => "localized_text",
            FieldKind::LocalizedMarkdown => "localized_markdown",
            FieldKind::Slug => "slug",
            FieldKind::Url => "url",
            FieldKind::Image => "image",
            FieldKind::Email => "email",
            FieldKind::Integer { .. } => "number",
            FieldKind::Bool => "checkbox",
            FieldKind::Tags => "tags",
            FieldKind::Reference { .. } => "reference",
        }
    }

    /// Whether values are stored as an `{en, vi}` pair.
    pub fn is_localized(&self) -> bool {
        matches!(
            self,
            FieldKind::Localized | FieldKind::LocalizedText | FieldKind::LocalizedMarkdown
        )
    }
}

/// Schema entry for one field of a content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// JSON key.
    pub name: &'static str,
    /// Label shown in admin forms.
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldDef {
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A content type persisted in the document store.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name, also the API path segment (`/api/{COLLECTION}`).
    const COLLECTION: &'static str;

    /// Singular human label ("Banner").
    const LABEL: &'static str;

    /// Plural human label ("Banners").
    const PLURAL: &'static str;

    /// Field schema in form order.
    fn fields() -> &'static [FieldDef];

    /// Short English title used in admin lists and reference pickers.
    fn title(&self) -> String;

    fn slug(&self) -> Option<&str> {
        None
    }

    /// Sort weight; lower sorts first.
    fn weight(&self) -> i32 {
        0
    }

    /// Unpublished documents are hidden from the public site and anonymous API.
    fn published(&self) -> bool {
        true
    }

    /// Ids of referenced documents, keyed by field name and target collection.
    fn references(&self) -> Vec<(&'static str, &'static str, Uuid)> {
        let Ok(value) = serde_json::to_value(self) else {
            return Vec::new();
        };
        Self::fields()
            .iter()
            .filter_map(|field| match field.kind {
                FieldKind::Reference { collection, .. } => value
                    .get(field.name)
                    .and_then(|v| v.as_str())
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .map(|id| (field.name, collection, id)),
                _ => None,
            })
            .collect()
    }
}

/// A document together with its storage metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Stored<D> {
    pub id: Uuid,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,

    #[serde(flatten)]
    pub doc: D,
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    /// Number of pages needed for `total` results (at least 1).
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 1;
        }
        let pages = (self.total.max(0) as u64).div_ceil(u64::from(self.per_page));
        pages.max(1) as u32
    }

    /// Map items while keeping pagination data.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}
