//! Products: fixed-fee legal packages and publications.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PUBLISHED, WEIGHT, default_published};
use crate::content::{Document, FieldDef, FieldKind, Localized};

const FIELDS: &[FieldDef] = &[
    FieldDef::new("name", "Name", FieldKind::Localized).required(),
    FieldDef::new("slug", "Slug", FieldKind::Slug).required(),
    FieldDef::new("summary", "Summary", FieldKind::LocalizedText),
    FieldDef::new("description", "Description", FieldKind::LocalizedMarkdown),
    FieldDef::new("image", "Image", FieldKind::Image),
    FieldDef::new(
        "price",
        "Price (VND)",
        FieldKind::Integer {
            min: 0,
            max: 1_000_000_000_000,
        },
    ),
    FieldDef::new(
        "category",
        "Category",
        FieldKind::Reference {
            collection: "categories",
            label_field: "name",
        },
    ),
    WEIGHT,
    PUBLISHED,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub name: Localized,
    pub slug: String,
    #[serde(default)]
    pub summary: Localized,
    #[serde(default)]
    pub description: Localized,
    #[serde(default)]
    pub image: Option<String>,
    /// Price in đồng; `None` means "contact us".
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub category: Option<Uuid>,
    #[serde(default)]
    pub weight: i32,
    #[serde(default = "default_published")]
    pub published: bool,
}

impl Document for Product {
    const COLLECTION: &'static str = "products";
    const LABEL: &'static str = "Product";
    const PLURAL: &'static str = "Products";

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

    fn published(&self) -> bool {
        self.published
    }
}
