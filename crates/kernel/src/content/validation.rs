//! Schema-driven document validation.
//!
//! Validation runs on the JSON form of a document so one set of rules covers
//! every content type, whether the input came from the API or an admin form.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::document::{Document, FieldDef, FieldKind};
use super::form::fill_missing_slug;

// Patterns are literals; compilation cannot fail.
#[allow(clippy::expect_used)]
static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern compiles")
});

#[allow(clippy::expect_used)]
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://[A-Za-z0-9.-]+(?::\d{1,5})?(?:[/?#]\S*)?|/(?:[^/\s]\S*)?)$")
        .expect("url pattern compiles")
});

#[allow(clippy::expect_used)]
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// Maximum slug length.
pub const MAX_SLUG_LENGTH: usize = 128;

/// A validation failure tied to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check a slug: lowercase ASCII words joined by single hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    slug.len() <= MAX_SLUG_LENGTH && SLUG_RE.is_match(slug)
}

/// Check a link target: absolute http(s) URL or site-relative path.
pub fn is_valid_url(url: &str) -> bool {
    URL_RE.is_match(url)
}

pub fn is_valid_email(mail: &str) -> bool {
    EMAIL_RE.is_match(mail)
}

/// Derive a slug from a title. Vietnamese diacritics are folded to ASCII.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        let c = fold_diacritic(c);
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    let slug: String = slug.chars().take(MAX_SLUG_LENGTH).collect();
    slug.trim_end_matches('-').to_string()
}

/// Map a lowercase Vietnamese letter to its base ASCII letter.
fn fold_diacritic(c: char) -> char {
    const GROUPS: &[(&str, char)] = &[
        ("àáảãạăằắẳẵặâầấẩẫậ", 'a'),
        ("èéẻẽẹêềếểễệ", 'e'),
        ("ìíỉĩị", 'i'),
        ("òóỏõọôồốổỗộơờớởỡợ", 'o'),
        ("ùúủũụưừứửữự", 'u'),
        ("ỳýỷỹỵ", 'y'),
        ("đ", 'd'),
    ];
    GROUPS
        .iter()
        .find(|(letters, _)| letters.contains(c))
        .map_or(c, |&(_, base)| base)
}

/// Validate a document's JSON against its schema.
///
/// Returns every failure rather than stopping at the first one so forms can
/// show all problems at once.
pub fn validate_document(fields: &[FieldDef], doc: &Value) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for field in fields {
        let value = doc.get(field.name).unwrap_or(&Value::Null);

        if field.kind.is_localized() {
            validate_localized(field, value, &mut errors);
            continue;
        }

        match field.kind {
            FieldKind::Bool => {
                if !(value.is_null() || value.is_boolean()) {
                    errors.push(FieldError::new(
                        field.name,
                        format!("{} must be true or false.", field.label),
                    ));
                }
            }
            FieldKind::Integer { min, max } => match value {
                Value::Null if field.required => {
                    errors.push(required(field));
                }
                Value::Null => {}
                Value::Number(n) => match n.as_i64() {
                    Some(n) if (min..=max).contains(&n) => {}
                    _ => errors.push(FieldError::new(
                        field.name,
                        format!("{} must be a whole number between {min} and {max}.", field.label),
                    )),
                },
                _ => errors.push(FieldError::new(
                    field.name,
                    format!("{} must be a number.", field.label),
                )),
            },
            FieldKind::Tags => match value {
                Value::Null if field.required => errors.push(required(field)),
                Value::Null => {}
                Value::Array(items) => {
                    if field.required && items.is_empty() {
                        errors.push(required(field));
                    }
                    if items.iter().any(|item| !item.is_string()) {
                        errors.push(FieldError::new(
                            field.name,
                            format!("{} must be a list of text values.", field.label),
                        ));
                    }
                }
                _ => errors.push(FieldError::new(
                    field.name,
                    format!("{} must be a list.", field.label),
                )),
            },
            _ => validate_text(field, value, &mut errors),
        }
    }

    errors
}

fn required(field: &FieldDef) -> FieldError {
    FieldError::new(field.name, format!("{} is required.", field.label))
}

fn validate_localized(field: &FieldDef, value: &Value, errors: &mut Vec<FieldError>) {
    if value.is_null() {
        if field.required {
            errors.push(required(field));
        }
        return;
    }

    let Some(obj) = value.as_object() else {
        errors.push(FieldError::new(
            field.name,
            format!("{} must be an object with 'en' and 'vi' text.", field.label),
        ));
        return;
    };

    for (lang, text) in obj {
        if lang != "en" && lang != "vi" {
            errors.push(FieldError::new(
                format!("{}.{lang}", field.name),
                format!("Unsupported language '{lang}'."),
            ));
        } else if !text.is_string() {
            errors.push(FieldError::new(
                format!("{}.{lang}", field.name),
                format!("{} ({lang}) must be text.", field.label),
            ));
        }
    }

    let english = obj.get("en").and_then(Value::as_str).unwrap_or_default();
    if field.required && english.trim().is_empty() {
        errors.push(FieldError::new(
            format!("{}.en", field.name),
            format!("{} (English) is required.", field.label),
        ));
    }
}

fn validate_text(field: &FieldDef, value: &Value, errors: &mut Vec<FieldError>) {
    let text = match value {
        Value::Null => "",
        Value::String(s) => s.trim(),
        _ => {
            errors.push(FieldError::new(
                field.name,
                format!("{} must be text.", field.label),
            ));
            return;
        }
    };

    if text.is_empty() {
        if field.required {
            errors.push(required(field));
        }
        return;
    }

    let ok = match field.kind {
        FieldKind::Slug => is_valid_slug(text),
        FieldKind::Url | FieldKind::Image => is_valid_url(text),
        FieldKind::Email => is_valid_email(text),
        FieldKind::Reference { .. } => Uuid::parse_str(text).is_ok(),
        _ => true,
    };

    if !ok {
        let message = match field.kind {
            FieldKind::Slug => format!(
                "{} may only contain lowercase letters, numbers, and single hyphens.",
                field.label
            ),
            FieldKind::Url | FieldKind::Image => format!(
                "{} must be an http(s) URL or a path starting with '/'.",
                field.label
            ),
            FieldKind::Email => format!("{} must be a valid email address.", field.label),
            _ => format!("{} is not a valid reference.", field.label),
        };
        errors.push(FieldError::new(field.name, message));
    }
}

/// Turn untrusted JSON into a typed document.
///
/// Fills an empty slug from the title, validates against the schema, then
/// deserializes. Null members are dropped first so optional fields and
/// serde defaults apply.
pub fn parse_document<D: Document>(mut value: Value) -> Result<D, Vec<FieldError>> {
    if !value.is_object() {
        return Err(vec![FieldError::new("", "Document must be a JSON object.")]);
    }

    trim_text_fields(D::fields(), &mut value);
    fill_missing_slug(D::fields(), &mut value);

    let errors = validate_document(D::fields(), &value);
    if !errors.is_empty() {
        return Err(errors);
    }

    if let Some(obj) = value.as_object_mut() {
        obj.retain(|_, v| !v.is_null());
    }

    serde_json::from_value(value).map_err(|e| vec![FieldError::new("", e.to_string())])
}

/// Trim single-line text values in place.
fn trim_text_fields(fields: &[FieldDef], doc: &mut Value) {
    let Some(obj) = doc.as_object_mut() else {
        return;
    };
    for field in fields {
        let single_line = matches!(
            field.kind,
            FieldKind::Text
                | FieldKind::Slug
                | FieldKind::Url
                | FieldKind::Image
                | FieldKind::Email
                | FieldKind::Reference { .. }
        );
        if !single_line {
            continue;
        }
        let trimmed = match obj.get(field.name) {
            Some(Value::String(s)) => s.trim().to_string(),
            _ => continue,
        };
        let value = if trimmed.is_empty() {
            Value::Null
        } else {
            Value::String(trimmed)
        };
        obj.insert(field.name.to_string(), value);
    }
}
