//! Navigation menu links.
//!
//! Links form a tree through the optional `parent` reference. The public
//! site renders the published links as nested navigation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PUBLISHED, WEIGHT, default_published};
use crate::content::{Document, FieldDef, FieldKind, Language, Localized, Stored};

const FIELDS: &[FieldDef] = &[
    FieldDef::new("label", "Label", FieldKind::Localized).required(),
    FieldDef::new("url", "URL", FieldKind::Url).required(),
    FieldDef::new(
        "parent",
        "Parent",
        FieldKind::Reference {
            collection: "menus",
            label_field: "label",
        },
    ),
    WEIGHT,
    PUBLISHED,
];

/// Menu link record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuLink {
    pub label: Localized,

    /// Link destination, absolute or site relative.
    pub url: String,

    /// Optional parent link for hierarchy.
    #[serde(default)]
    pub parent: Option<Uuid>,

    /// Sort weight (lower = higher priority).
    #[serde(default)]
    pub weight: i32,

    #[serde(default = "default_published")]
    pub published: bool,
}

impl Document for MenuLink {
    const COLLECTION: &'static str = "menus";
    const LABEL: &'static str = "Menu link";
    const PLURAL: &'static str = "Menu links";

    fn fields() -> &'static [FieldDef] {
        FIELDS
    }

    fn title(&self) -> String {
        self.label.en.clone()
    }

    fn weight(&self) -> i32 {
        self.weight
    }

    fn published(&self) -> bool {
        self.published
    }
}

/// A menu link resolved for one language, with its children.
#[derive(Debug, Clone, Serialize)]
pub struct MenuTreeNode {
    pub id: Uuid,
    pub label: String,
    pub url: String,
    pub children: Vec<MenuTreeNode>,
}

impl MenuLink {
    /// Arrange links into a tree, labels resolved for `lang`.
    ///
    /// Input order is kept among siblings, so pass links already sorted by
    /// weight. Links whose parent is missing become roots; links caught in
    /// a parent cycle are dropped.
    pub fn build_tree(links: &[Stored<MenuLink>], lang: Language) -> Vec<MenuTreeNode> {
        let known: HashMap<Uuid, &Stored<MenuLink>> = links.iter().map(|l| (l.id, l)).collect();

        let mut children: HashMap<Uuid, Vec<&Stored<MenuLink>>> = HashMap::new();
        let mut roots = Vec::new();
        for link in links {
            match link.doc.parent {
                Some(parent) if parent != link.id && known.contains_key(&parent) => {
                    children.entry(parent).or_default().push(link);
                }
                _ => roots.push(link),
            }
        }

        roots
            .into_iter()
            .map(|link| Self::node(link, &children, lang))
            .collect()
    }

    fn node(
        link: &Stored<MenuLink>,
        children: &HashMap<Uuid, Vec<&Stored<MenuLink>>>,
        lang: Language,
    ) -> MenuTreeNode {
        MenuTreeNode {
            id: link.id,
            label: link.doc.label.get(lang).to_string(),
            url: link.doc.url.clone(),
            children: children
                .get(&link.id)
                .map(|kids| {
                    kids.iter()
                        .map(|kid| Self::node(kid, children, lang))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}
