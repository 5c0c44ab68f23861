//! Homepage hero banners.

use serde::{Deserialize, Serialize};

use super::{PUBLISHED, WEIGHT, default_published};
use crate::content::{Document, FieldDef, FieldKind, Localized};

const FIELDS: &[FieldDef] = &[
    FieldDef::new("title", "Title", FieldKind::Localized).required(),
    FieldDef::new("subtitle", "Subtitle", FieldKind::LocalizedText),
    FieldDef::new("image", "Image", FieldKind::Image).required(),
    FieldDef::new("link", "Link", FieldKind::Url),
    WEIGHT,
    PUBLISHED,
];

/// A slide in the homepage banner carousel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Banner {
    pub title: Localized,
    #[serde(default)]
    pub subtitle: Localized,
    pub image: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub weight: i32,
    #[serde(default = "default_published")]
    pub published: bool,
}

impl Document for Banner {
    const COLLECTION: &'static str = "banners";
    const LABEL: &'static str = "Banner";
    const PLURAL: &'static str = "Banners";

    fn fields() -> &'static [FieldDef] {
        FIELDS
    }

    fn title(&self) -> String {
        self.title.en.clone()
    }

    fn weight(&self) -> i32 {
        self.weight
    }

    fn published(&self) -> bool {
        self.published
    }
}
