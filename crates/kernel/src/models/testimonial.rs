//! Client testimonials.

use serde::{Deserialize, Serialize};

use super::{PUBLISHED, WEIGHT, default_published};
use crate::content::{Document, FieldDef, FieldKind, Localized};

const FIELDS: &[FieldDef] = &[
    FieldDef::new("author", "Author", FieldKind::Text).required(),
    FieldDef::new("role", "Role", FieldKind::Localized),
    FieldDef::new("quote", "Quote", FieldKind::LocalizedText).required(),
    FieldDef::new("avatar", "Photo", FieldKind::Image),
    FieldDef::new("rating", "Rating", FieldKind::Integer { min: 1, max: 5 }),
    WEIGHT,
    PUBLISHED,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Testimonial {
    pub author: String,
    /// Author's title and company.
    #[serde(default)]
    pub role: Localized,
    pub quote: Localized,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Star rating, 1 to 5.
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub weight: i32,
    #[serde(default = "default_published")]
    pub published: bool,
}

impl Document for Testimonial {
    const COLLECTION: &'static str = "testimonials";
    const LABEL: &'static str = "Testimonial";
    const PLURAL: &'static str = "Testimonials";

    fn fields() -> &'static [FieldDef] {
        FIELDS
    }

    fn title(&self) -> String {
        self.author.clone()
    }

    fn weight(&self) -> i32 {
        self.weight
    }

    fn published(&self) -> bool {
        self.published
    }
}
