//! Case studies: past matters the firm can talk about.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PUBLISHED, WEIGHT, default_published};
use crate::content::{Document, FieldDef, FieldKind, Localized};

const FIELDS: &[FieldDef] = &[
    FieldDef::new("title", "Title", FieldKind::Localized).required(),
    FieldDef::new("slug", "Slug", FieldKind::Slug).required(),
    FieldDef::new("client", "Client", FieldKind::Text),
    FieldDef::new("summary", "Summary", FieldKind::LocalizedText).required(),
    FieldDef::new("body", "Body", FieldKind::LocalizedMarkdown),
    FieldDef::new("image", "Image", FieldKind::Image),
    FieldDef::new(
        "service",
        "Service",
        FieldKind::Reference {
            collection: "services",
            label_field: "title",
        },
    ),
    WEIGHT,
    PUBLISHED,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseStudy {
    pub title: Localized,
    pub slug: String,
    #[serde(default)]
    pub client: Option<String>,
    pub summary: Localized,
    #[serde(default)]
    pub body: Localized,
    #[serde(default)]
    pub image: Option<String>,
    /// Practice area the matter belongs to.
    #[serde(default)]
    pub service: Option<Uuid>,
    #[serde(default)]
    pub weight: i32,
    #[serde(default = "default_published")]
    pub published: bool,
}

impl Document for CaseStudy {
    const COLLECTION: &'static str = "case_studies";
    const LABEL: &'static str = "Case study";
    const PLURAL: &'static str = "Case studies";

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
