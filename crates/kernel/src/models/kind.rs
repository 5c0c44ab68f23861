//! Types: top-level groupings for categories ("News", "Practice areas").

use serde::{Deserialize, Serialize};

use crate::content::{Document, FieldDef, FieldKind, Localized};

const FIELDS: &[FieldDef] = &[
    FieldDef::new("name", "Name", FieldKind::Localized).required(),
    FieldDef::new("slug", "Slug", FieldKind::Slug).required(),
    FieldDef::new("description", "Description", FieldKind::LocalizedText),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kind {
    pub name: Localized,
    pub slug: String,
    #[serde(default)]
    pub description: Localized,
}

impl Document for Kind {
    const COLLECTION: &'static str = "types";
    const LABEL: &'static str = "Type";
    const PLURAL: &'static str = "Types";

    fn fields() -> &'static [FieldDef] {
        FIELDS
    }

    fn title(&self) -> String {
        self.name.en.clone()
    }

    fn slug(&self) -> Option<&str> {
        Some(&self.slug)
    }
}
