//! Conversion between flat HTML form submissions and document JSON.
//!
//! Admin forms post flat `name=value` pairs; bilingual fields use
//! `field.en` / `field.vi` keys. The schema decides how each field is
//! reassembled so the result can go through the same validation path as
//! JSON API input.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::document::{FieldDef, FieldKind};
use super::validation::slugify;

/// Build document JSON from submitted form pairs.
///
/// Keys that are not part of the schema (CSRF token, form build id) are
/// ignored.
pub fn form_to_json(fields: &[FieldDef], pairs: &[(String, String)]) -> Value {
    let mut submitted: HashMap<&str, &str> = HashMap::with_capacity(pairs.len());
    for (key, value) in pairs {
        submitted.insert(key.as_str(), value.as_str());
    }

    let mut doc = Map::new();
    for field in fields {
        let value = if field.kind.is_localized() {
            let multiline = !matches!(field.kind, FieldKind::Localized);
            let mut pair = Map::new();
            for lang in ["en", "vi"] {
                let key = format!("{}.{lang}", field.name);
                let raw = submitted.get(key.as_str()).copied().unwrap_or_default();
                let text = if multiline { raw.trim_end() } else { raw.trim() };
                pair.insert(lang.to_string(), Value::String(normalize_newlines(text)));
            }
            Value::Object(pair)
        } else {
            let raw = submitted.get(field.name).copied();
            field_value(field.kind, raw)
        };
        doc.insert(field.name.to_string(), value);
    }

    Value::Object(doc)
}

fn field_value(kind: FieldKind, raw: Option<&str>) -> Value {
    let text = raw.map(str::trim).unwrap_or_default();
    match kind {
        FieldKind::Bool => Value::Bool(matches!(text, "on" | "true" | "1" | "yes")),
        FieldKind::Integer { .. } => {
            if text.is_empty() {
                Value::Null
            } else {
                // Keep unparseable input as text so validation can report it.
                text.parse::<i64>()
                    .map(Value::from)
                    .unwrap_or_else(|_| Value::String(text.to_string()))
            }
        }
        FieldKind::Tags => Value::Array(
            text.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| Value::String(t.to_string()))
                .collect(),
        ),
        FieldKind::TextArea => match raw.map(str::trim_end) {
            Some(t) if !t.trim().is_empty() => Value::String(normalize_newlines(t)),
            _ => Value::Null,
        },
        _ if text.is_empty() => Value::Null,
        _ => Value::String(text.to_string()),
    }
}

/// Browsers submit textarea content with CRLF line endings.
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Fill an empty slug from the document's first required text field.
///
/// Returns true if a slug was generated.
pub fn fill_missing_slug(fields: &[FieldDef], doc: &mut Value) -> bool {
    let Some(slug_field) = fields.iter().find(|f| f.kind == FieldKind::Slug) else {
        return false;
    };

    let has_slug = doc
        .get(slug_field.name)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());
    if has_slug {
        return false;
    }

    let source = fields
        .iter()
        .filter(|f| f.required)
        .find_map(|f| match f.kind {
            FieldKind::Text => doc.get(f.name).and_then(Value::as_str),
            FieldKind::Localized => doc
                .get(f.name)
                .and_then(|v| v.get("en"))
                .and_then(Value::as_str),
            _ => None,
        })
        .map(slugify)
        .filter(|s| !s.is_empty());

    match (source, doc.as_object_mut()) {
        (Some(slug), Some(obj)) => {
            obj.insert(slug_field.name.to_string(), Value::String(slug));
            true
        }
        _ => false,
    }
}

/// Render one field of a stored document as the text an input should show.
///
/// Bilingual fields are looked up with `lang`; tags are joined with commas.
pub fn display_value(field: &FieldDef, doc: &Value, lang: Option<&str>) -> String {
    let value = doc.get(field.name).unwrap_or(&Value::Null);
    let value = match lang {
        Some(lang) if field.kind.is_localized() => value.get(lang).unwrap_or(&Value::Null),
        _ => value,
    };

    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
