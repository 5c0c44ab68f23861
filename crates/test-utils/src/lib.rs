//! Lexsite test utilities.
//!
//! Fixture builders that produce document JSON in the shape the content
//! API accepts, plus small assertion helpers.

use serde_json::{Map, Value, json};
use uuid::Uuid;

/// A slug that no other test will use.
pub fn unique_slug(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &id[..12])
}

/// Bilingual text value.
pub fn localized(en: &str, vi: &str) -> Value {
    json!({"en": en, "vi": vi})
}

/// A document builder for API and store fixtures.
#[derive(Debug, Clone, Default)]
pub struct DocumentFixture {
    fields: Map<String, Value>,
}

impl DocumentFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set any field.
    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// Set a bilingual field.
    pub fn with_localized(self, name: &str, en: &str, vi: &str) -> Self {
        self.with(name, localized(en, vi))
    }

    /// Set the Vietnamese half of a bilingual field, keeping the English.
    pub fn with_vi(mut self, name: &str, vi: &str) -> Self {
        let entry = self
            .fields
            .entry(name.to_string())
            .or_insert_with(|| json!({"en": ""}));
        if let Some(pair) = entry.as_object_mut() {
            pair.insert("vi".to_string(), Value::String(vi.to_string()));
        }
        self
    }

    pub fn with_slug(self, slug: &str) -> Self {
        self.with("slug", Value::String(slug.to_string()))
    }

    pub fn with_weight(self, weight: i32) -> Self {
        self.with("weight", json!(weight))
    }

    /// Point a reference field at another document.
    pub fn referencing(self, field: &str, id: Uuid) -> Self {
        self.with(field, Value::String(id.to_string()))
    }

    pub fn unpublished(self) -> Self {
        self.with("published", Value::Bool(false))
    }

    /// Field value, if set.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Practice area with a fresh slug.
pub fn service(title: &str) -> DocumentFixture {
    DocumentFixture::new()
        .with_localized("title", title, "")
        .with_slug(&unique_slug("service"))
        .with_localized("summary", &format!("{title} summary"), "")
        .with_localized("body", &format!("About **{title}**."), "")
}

/// Blog post with a fresh slug.
pub fn post(title: &str) -> DocumentFixture {
    DocumentFixture::new()
        .with_localized("title", title, "")
        .with_slug(&unique_slug("post"))
        .with_localized("excerpt", &format!("{title} excerpt"), "")
        .with_localized("body", &format!("{title} body"), "")
}

/// Blog or product category with a fresh slug.
pub fn category(name: &str) -> DocumentFixture {
    DocumentFixture::new()
        .with_localized("name", name, "")
        .with_slug(&unique_slug("category"))
}

/// Team member with a fresh slug.
pub fn member(name: &str) -> DocumentFixture {
    DocumentFixture::new()
        .with("name", Value::String(name.to_string()))
        .with_slug(&unique_slug("member"))
        .with_localized("position", "Partner", "Luật sư thành viên")
}

/// Case study with a fresh slug.
pub fn case_study(title: &str) -> DocumentFixture {
    DocumentFixture::new()
        .with_localized("title", title, "")
        .with_slug(&unique_slug("case"))
        .with_localized("summary", &format!("{title} summary"), "")
}

/// Product or package with a fresh slug.
pub fn product(name: &str) -> DocumentFixture {
    DocumentFixture::new()
        .with_localized("name", name, "")
        .with_slug(&unique_slug("product"))
        .with_localized("summary", &format!("{name} summary"), "")
}

/// Navigation entry.
pub fn menu_link(label: &str, url: &str) -> DocumentFixture {
    DocumentFixture::new()
        .with_localized("label", label, "")
        .with("url", Value::String(url.to_string()))
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a validation error body names `field`.
    pub fn field_error(body: &Value, field: &str) {
        let found = body["fields"]
            .as_array()
            .is_some_and(|fields| fields.iter().any(|f| f["field"] == field));
        assert!(found, "Expected a validation error on '{field}', got: {body}");
    }
}
