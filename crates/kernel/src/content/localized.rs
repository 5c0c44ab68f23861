//! Languages and bilingual text values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A language the site is published in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Vi,
}

impl Language {
    /// Every supported language, default first.
    pub const ALL: [Language; 2] = [Language::En, Language::Vi];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Vi => "vi",
        }
    }

    /// Native display name, used by the language toggle.
    pub fn native_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Vi => "Tiếng Việt",
        }
    }

    /// Parse a language code. Region subtags (`vi-VN`) are accepted.
    pub fn parse(code: &str) -> Option<Self> {
        let primary = code.trim().split(['-', '_']).next()?.to_lowercase();
        match primary.as_str() {
            "en" => Some(Language::En),
            "vi" => Some(Language::Vi),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A text value stored once per language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Localized {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub vi: String,
}

impl Localized {
    pub fn new(en: impl Into<String>, vi: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            vi: vi.into(),
        }
    }

    /// Text for `lang`, falling back to English when the translation is blank.
    pub fn get(&self, lang: Language) -> &str {
        match lang {
            Language::Vi if !self.vi.trim().is_empty() => &self.vi,
            _ => &self.en,
        }
    }

    /// Whether a non-blank value exists for `lang` (no fallback).
    pub fn has(&self, lang: Language) -> bool {
        let value = match lang {
            Language::En => &self.en,
            Language::Vi => &self.vi,
        };
        !value.trim().is_empty()
    }

    /// True when neither language has content.
    pub fn is_blank(&self) -> bool {
        !self.has(Language::En) && !self.has(Language::Vi)
    }
}
