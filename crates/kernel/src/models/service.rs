//! Practice areas offered by the firm.

use serde::{Deserialize, Serialize};

use super::{PUBLISHED, WEIGHT, default_published};
use crate::content::{Document, FieldDef, FieldKind, Localized};

const FIELDS: &[FieldDef] = &[
    FieldDef::new("title", "Title", FieldKind::Localized).required(),
    FieldDef::new("slug", "Slug", FieldKind::Slug).required(),
    FieldDef::new("summary", "Summary", FieldKind::LocalizedText).required(),
    FieldDef::new("body", "Body", FieldKind::LocalizedMarkdown),
    FieldDef::new("icon", "Icon", FieldKind::Image),
    WEIGHT,
    PUBLISHED,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub title: Localized,
    pub slug: String,
    pub summary: Localized,
    #[serde(default)]
    pub body: Localized,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub weight: i32,
    #[serde(default = "default_published")]
    pub published: bool,
}

impl Document for Service {
    const COLLECTION: &'static str = "services";
    const LABEL: &'static str = "Service";
    const PLURAL: &'static str = "Services";

    fn fields() -> &'static [FieldDef] {
        FIELDS
    }

    fn title(&self) -> String {
        self.title.en.clone()
    }

    fn slug(&self) -> Option<&str> {
        Some(&self.slug)
    }

    fn weight(&self) -> i32 {
        self.weight
    }

    fn published(&self) -> bool {
        self.published
    }
}
