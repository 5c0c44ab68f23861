//! Content types and user accounts.
//!
//! Each content type is a plain serde struct implementing
//! [`Document`](crate::content::Document). Users live in their own table.

pub mod banner;
pub mod case_study;
pub mod category;
pub mod kind;
pub mod member;
pub mod menu_link;
pub mod post;
pub mod product;
pub mod service;
pub mod testimonial;
pub mod user;

pub use banner::Banner;
pub use case_study::CaseStudy;
pub use category::Category;
pub use kind::Kind;
pub use member::Member;
pub use menu_link::{MenuLink, MenuTreeNode};
pub use post::Post;
pub use product::Product;
pub use service::Service;
pub use testimonial::Testimonial;
pub use user::{CreateUser, UpdateUser, User};

use crate::content::{FieldDef, FieldKind};

/// Sort weight field shared by ordered collections.
pub(crate) const WEIGHT: FieldDef = FieldDef::new(
    "weight",
    "Weight",
    FieldKind::Integer {
        min: -1000,
        max: 1000,
    },
);

/// Publication checkbox shared by public collections.
pub(crate) const PUBLISHED: FieldDef = FieldDef::new("published", "Published", FieldKind::Bool);

/// Serde default for `published`: documents are public unless unchecked.
pub(crate) fn default_published() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::{Map, Value, json};

    use super::*;
    use crate::content::{Document, parse_document};

    /// A document that satisfies every field of a schema.
    fn sample(fields: &[FieldDef]) -> Value {
        let mut doc = Map::new();
        for field in fields {
            let value = match field.kind {
                FieldKind::Text | FieldKind::TextArea => json!("Sample"),
                FieldKind::Localized
                | FieldKind::LocalizedText
                | FieldKind::LocalizedMarkdown => json!({"en": "Sample", "vi": "Mẫu"}),
                FieldKind::Slug => json!("sample"),
                FieldKind::Url | FieldKind::Image => json!("/files/sample.png"),
                FieldKind::Email => json!("office@example.vn"),
                FieldKind::Integer { min, .. } => json!(min),
                FieldKind::Bool => json!(true),
                FieldKind::Tags => json!(["one", "two"]),
                FieldKind::Reference { .. } => Value::Null,
            };
            doc.insert(field.name.to_string(), value);
        }
        Value::Object(doc)
    }

    /// Schema and struct must agree: a schema-valid sample deserializes and
    /// every schema field survives serialization.
    fn assert_schema_matches<D: Document>() {
        let doc: D = parse_document(sample(D::fields()))
            .unwrap_or_else(|e| panic!("{} sample rejected: {e:?}", D::COLLECTION));
        let out = serde_json::to_value(&doc).unwrap();
        for field in D::fields() {
            assert!(
                out.get(field.name).is_some(),
                "{}.{} missing from serialized document",
                D::COLLECTION,
                field.name
            );
        }
        assert!(!doc.title().is_empty());
    }

    #[test]
    fn schemas_match_structs() {
        assert_schema_matches::<Banner>();
        assert_schema_matches::<CaseStudy>();
        assert_schema_matches::<Category>();
        assert_schema_matches::<Kind>();
        assert_schema_matches::<Member>();
        assert_schema_matches::<MenuLink>();
        assert_schema_matches::<Post>();
        assert_schema_matches::<Product>();
        assert_schema_matches::<Service>();
        assert_schema_matches::<Testimonial>();
    }

    #[test]
    fn collections_are_unique() {
        let mut names = vec![
            Banner::COLLECTION,
            CaseStudy::COLLECTION,
            Category::COLLECTION,
            Kind::COLLECTION,
            Member::COLLECTION,
            MenuLink::COLLECTION,
            Post::COLLECTION,
            Product::COLLECTION,
            Service::COLLECTION,
            Testimonial::COLLECTION,
        ];
        let count = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), count);
        assert!(!names.contains(&"users"));
    }

    #[test]
    fn references_point_at_known_collections() {
        let known = [
            Banner::COLLECTION,
            CaseStudy::COLLECTION,
            Category::COLLECTION,
            Kind::COLLECTION,
            Member::COLLECTION,
            MenuLink::COLLECTION,
            Post::COLLECTION,
            Product::COLLECTION,
            Service::COLLECTION,
            Testimonial::COLLECTION,
        ];
        let schemas: [&[FieldDef]; 10] = [
            Banner::fields(),
            CaseStudy::fields(),
            Category::fields(),
            Kind::fields(),
            Member::fields(),
            MenuLink::fields(),
            Post::fields(),
            Product::fields(),
            Service::fields(),
            Testimonial::fields(),
        ];
        for field in schemas.iter().flat_map(|s| s.iter()) {
            if let FieldKind::Reference { collection, .. } = field.kind {
                assert!(known.contains(&collection), "unknown collection {collection}");
            }
        }
    }
}
