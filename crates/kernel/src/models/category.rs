//! Categories for posts and products.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::WEIGHT;
use crate::content::{Document, FieldDef, FieldKind, Localized};

const FIELDS: &[FieldDef] = &[
    FieldDef::new("name", "Name", FieldKind::Localized).required(),
    FieldDef::new("slug", "Slug", FieldKind::Slug).required(),
    FieldDef::new(
        "kind",
        "Type",
        FieldKind::Reference {
            collection: "types",
            label_field: "name",
        },
    ),
    FieldDef::new("description", "Description", FieldKind::LocalizedText),
    WEIGHT,
];

/// A category, optionally grouped under a [`Kind`](super::Kind).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: Localized,
    pub slug: String,
    #[serde(default)]
    pub kind: Option<Uuid>,
    #[serde(default)]
    pub description: Localized,
    #[serde(default)]
    pub weight: i32,
}

impl Document for Category {
    const COLLECTION: &'static str = "categories";
    const LABEL: &'static str = "Category";
    const PLURAL: &'static str = "Categories";

    fn fields() -> &'static [FieldDef] {
        FIELDS
    }

    fn title(&self) -> String {
        self.name.en.clone()
    }

    fn slug(&self) -> Option<&str> {
        Some(&self.slug)
    }

    fn weight(&self) -> i32 {
        self.weight
    }
}
