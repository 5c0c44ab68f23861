//! Theme engine with Tera templates and custom filters.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tera::{Tera, Value};
use tracing::debug;

use crate::content::{FilterPipeline, Language};

type FilterArgs = HashMap<String, Value>;

/// Theme engine for rendering templates.
pub struct ThemeEngine {
    /// Tera template engine instance.
    tera: Tera,
}

impl ThemeEngine {
    /// Create a new theme engine loading templates from the given directory.
    pub fn new(template_dir: &Path) -> Result<Self> {
        let pattern = template_dir.join("**/*.html");
        let pattern_str = pattern
            .to_str()
            .context("invalid template directory path")?;

        let mut tera = Tera::new(pattern_str).context("failed to initialize Tera templates")?;
        Self::register_filters(&mut tera);

        let template_names: Vec<_> = tera.get_template_names().collect();
        debug!(count = template_names.len(), "loaded templates");

        Ok(Self { tera })
    }

    /// Create a theme engine from in-memory templates (for testing).
    pub fn from_raw(templates: &[(&str, &str)]) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(templates.iter().copied())
            .context("failed to add raw templates")?;
        Self::register_filters(&mut tera);
        Ok(Self { tera })
    }

    /// Register custom Tera filters.
    fn register_filters(tera: &mut Tera) {
        // {{ service.title | localize(lang=lang) }}
        tera.register_filter("localize", |value: &Value, args: &FilterArgs| {
            Ok(Value::String(localize(value, lang_arg(args))))
        });

        // {{ post.body | localize(lang=lang) | markdown | safe }}
        tera.register_filter("markdown", |value: &Value, _args: &FilterArgs| {
            let text = tera::try_get_value!("markdown", "value", String, value);
            Ok(Value::String(FilterPipeline::markdown().process(&text)))
        });

        // Plain text with line breaks kept.
        tera.register_filter("text_format", |value: &Value, args: &FilterArgs| {
            let text = tera::try_get_value!("text_format", "value", String, value);
            let format = args
                .get("format")
                .and_then(|v| v.as_str())
                .unwrap_or("plain_text");
            Ok(Value::String(FilterPipeline::for_format(format).process(&text)))
        });

        // Unix timestamps or RFC 3339 strings; Vietnamese pages get day-first dates.
        tera.register_filter("format_date", |value: &Value, args: &FilterArgs| {
            let formatted = to_datetime(value)
                .map(|dt| format_date(dt, lang_arg(args)))
                .unwrap_or_default();
            Ok(Value::String(formatted))
        });
    }

    /// Render a template with the given context.
    pub fn render(&self, template: &str, context: &tera::Context) -> Result<String> {
        self.tera
            .render(template, context)
            .with_context(|| format!("failed to render template {template}"))
    }
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("template_count", &self.tera.get_template_names().count())
            .finish()
    }
}

fn lang_arg(args: &FilterArgs) -> Language {
    args.get("lang")
        .and_then(|v| v.as_str())
        .and_then(Language::parse)
        .unwrap_or_default()
}

/// Pick one language from an `{en, vi}` value, falling back to English.
fn localize(value: &Value, lang: Language) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => {
            let pick = |code: &str| {
                map.get(code)
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
            };
            pick(lang.code())
                .or_else(|| pick(Language::En.code()))
                .unwrap_or_default()
                .to_string()
        }
        _ => String::new(),
    }
}

fn to_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => DateTime::from_timestamp(n.as_i64()?, 0),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

fn format_date(dt: DateTime<Utc>, lang: Language) -> String {
    match lang {
        Language::En => dt.format("%B %-d, %Y").to_string(),
        Language::Vi => dt.format("%d/%m/%Y").to_string(),
    }
}
