//! Blog posts and firm news.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PUBLISHED, default_published};
use crate::content::{Document, FieldDef, FieldKind, Localized};

const FIELDS: &[FieldDef] = &[
    FieldDef::new("title", "Title", FieldKind::Localized).required(),
    FieldDef::new("slug", "Slug", FieldKind::Slug).required(),
    FieldDef::new("excerpt", "Excerpt", FieldKind::LocalizedText),
    FieldDef::new("body", "Body", FieldKind::LocalizedMarkdown),
    FieldDef::new("cover_image", "Cover image", FieldKind::Image),
    FieldDef::new(
        "category",
        "Category",
        FieldKind::Reference {
            collection: "categories",
            label_field: "name",
        },
    ),
    FieldDef::new("tags", "Tags", FieldKind::Tags),
    FieldDef::new("author", "Author", FieldKind::Text),
    PUBLISHED,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub title: Localized,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Localized,
    #[serde(default)]
    pub body: Localized,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub category: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default = "default_published")]
    pub published: bool,
}

impl Document for Post {
    const COLLECTION: &'static str = "posts";
    const LABEL: &'static str = "Post";
    const PLURAL: &'static str = "Posts";

    fn fields() -> &'static [FieldDef] {
        FIELDS
    }

    fn title(&self) -> String {
        self.title.en.clone()
    }

    fn slug(&self) -> Option<&str> {
        Some(&self.slug)
    }

    fn published(&self) -> bool {
        self.published
    }
}
