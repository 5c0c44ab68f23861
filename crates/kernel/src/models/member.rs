//! Team members (lawyers and staff).

use serde::{Deserialize, Serialize};

use super::{PUBLISHED, WEIGHT, default_published};
use crate::content::{Document, FieldDef, FieldKind, Localized};

const FIELDS: &[FieldDef] = &[
    FieldDef::new("name", "Name", FieldKind::Text).required(),
    FieldDef::new("slug", "Slug", FieldKind::Slug).required(),
    FieldDef::new("position", "Position", FieldKind::Localized).required(),
    FieldDef::new("bio", "Biography", FieldKind::LocalizedMarkdown),
    FieldDef::new("avatar", "Photo", FieldKind::Image),
    FieldDef::new("email", "Email", FieldKind::Email),
    FieldDef::new("phone", "Phone", FieldKind::Text),
    FieldDef::new("linkedin", "LinkedIn", FieldKind::Url),
    WEIGHT,
    PUBLISHED,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Personal names are not translated.
    pub name: String,
    pub slug: String,
    pub position: Localized,
    #[serde(default)]
    pub bio: Localized,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub weight: i32,
    #[serde(default = "default_published")]
    pub published: bool,
}

impl Document for Member {
    const COLLECTION: &'static str = "members";
    const LABEL: &'static str = "Member";
    const PLURAL: &'static str = "Members";

    fn fields() -> &'static [FieldDef] {
        FIELDS
    }

    fn title(&self) -> String {
        self.name.clone()
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
