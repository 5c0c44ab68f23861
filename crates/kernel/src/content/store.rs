//! Document store: every content collection in one JSONB table.
//!
//! Rows carry a few columns lifted out of the document (`slug`,
//! `published`, `weight`) for uniqueness, filtering, and ordering; the full
//! document lives in `data`.

use std::collections::HashMap;

use sea_query::{
    Asterisk, Expr, Iden, Order, PostgresQueryBuilder, Query, SelectStatement,
};
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::document::{Document, Page, Stored};

/// Largest page size a caller may request.
pub const MAX_PER_PAGE: u32 = 100;

/// Page size when none is requested.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Document table identifiers.
#[derive(Iden)]
enum DocumentIden {
    #[iden = "document"]
    Table,
    Id,
    Collection,
    Published,
    Weight,
    Data,
    Created,
    Changed,
}

/// Errors from document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("slug '{0}' is already in use")]
    SlugTaken(String),

    #[error("{field} refers to unknown document {id}")]
    MissingReference { field: String, id: Uuid },

    #[error("stored document could not be decoded")]
    Decode(#[from] serde_json::Error),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

/// Row shape shared by every collection.
#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    data: Value,
    created: i64,
    changed: i64,
}

impl DocumentRow {
    fn decode<D: Document>(self) -> Result<Stored<D>, StoreError> {
        let doc = serde_json::from_value(self.data)?;
        Ok(Stored {
            id: self.id,
            created: self.created,
            changed: self.changed,
            doc,
        })
    }
}

/// Listing parameters.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Only return published documents.
    pub published_only: bool,

    /// Top-level document field that must equal the given text.
    pub field_filter: Option<(String, String)>,

    /// 1-based page number.
    pub page: u32,

    pub per_page: u32,
}

impl ListQuery {
    pub fn new() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            ..Default::default()
        }
    }

    pub fn published_only(mut self) -> Self {
        self.published_only = true;
        self
    }

    pub fn where_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.field_filter = Some((field.into(), value.into()));
        self
    }

    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    /// Page and page size clamped to accepted ranges.
    fn bounds(&self) -> (u32, u32) {
        (self.page.max(1), self.per_page.clamp(1, MAX_PER_PAGE))
    }
}

/// SQL builder for document listings.
pub struct DocumentQueryBuilder<'a> {
    collection: &'a str,
    query: &'a ListQuery,
}

impl<'a> DocumentQueryBuilder<'a> {
    pub fn new(collection: &'a str, query: &'a ListQuery) -> Self {
        Self { collection, query }
    }

    /// SELECT for one page, ordered by weight then newest first.
    pub fn build(&self) -> String {
        let (page, per_page) = self.query.bounds();

        let mut select = Query::select();
        select
            .columns([
                DocumentIden::Id,
                DocumentIden::Data,
                DocumentIden::Created,
                DocumentIden::Changed,
            ])
            .from(DocumentIden::Table);
        self.add_filters(&mut select);

        select
            .order_by(DocumentIden::Weight, Order::Asc)
            .order_by(DocumentIden::Created, Order::Desc)
            .order_by(DocumentIden::Id, Order::Asc)
            .limit(u64::from(per_page))
            .offset(u64::from(page - 1) * u64::from(per_page));

        select.to_string(PostgresQueryBuilder)
    }

    /// COUNT(*) over the same filters.
    pub fn build_count(&self) -> String {
        let mut select = Query::select();
        select
            .expr(Expr::col(Asterisk).count())
            .from(DocumentIden::Table);
        self.add_filters(&mut select);
        select.to_string(PostgresQueryBuilder)
    }

    fn add_filters(&self, select: &mut SelectStatement) {
        select.and_where(Expr::col(DocumentIden::Collection).eq(self.collection));

        if self.query.published_only {
            select.and_where(Expr::col(DocumentIden::Published).eq(true));
        }

        if let Some((field, value)) = &self.query.field_filter {
            if is_valid_field_name(field) {
                // Field name is restricted to [a-z_]; the value is bound.
                select.and_where(Expr::cust_with_values(
                    format!("\"data\" ->> '{field}' = $1"),
                    [value.clone()],
                ));
            } else {
                warn!(field = %field, "ignoring filter on invalid field name");
                select.and_where(Expr::cust("FALSE"));
            }
        }
    }
}

/// Document field names usable in filters.
pub fn is_valid_field_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= 64 && name.bytes().all(|b| b.is_ascii_lowercase() || b == b'_')
}

/// Extract a display label from a document field that may be bilingual.
pub fn label_of(data: &Value, field: &str) -> String {
    match data.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(pair)) => pair
            .get("en")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// CRUD over the `document` table.
#[derive(Clone)]
pub struct DocumentStore {
    pool: PgPool,
}

impl DocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List one page of a collection.
    pub async fn list<D: Document>(&self, query: &ListQuery) -> Result<Page<Stored<D>>, StoreError> {
        let builder = DocumentQueryBuilder::new(D::COLLECTION, query);
        let (page, per_page) = query.bounds();

        let rows = sqlx::query_as::<_, DocumentRow>(&builder.build())
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = sqlx::query_scalar(&builder.build_count())
            .fetch_one(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(DocumentRow::decode::<D>)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }

    /// Up to `limit` published documents in display order.
    pub async fn published<D: Document>(&self, limit: u32) -> Result<Vec<Stored<D>>, StoreError> {
        let query = ListQuery::new().published_only().page(1, limit);
        Ok(self.list::<D>(&query).await?.items)
    }

    pub async fn get<D: Document>(&self, id: Uuid) -> Result<Option<Stored<D>>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data, created, changed FROM document WHERE id = $1 AND collection = $2",
        )
        .bind(id)
        .bind(D::COLLECTION)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DocumentRow::decode::<D>).transpose()
    }

    pub async fn find_by_slug<D: Document>(
        &self,
        slug: &str,
    ) -> Result<Option<Stored<D>>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data, created, changed FROM document WHERE collection = $1 AND slug = $2",
        )
        .bind(D::COLLECTION)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DocumentRow::decode::<D>).transpose()
    }

    /// Fetch several documents of one collection by id.
    pub async fn get_many<D: Document>(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Stored<D>>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data, created, changed FROM document WHERE collection = $1 AND id = ANY($2)",
        )
        .bind(D::COLLECTION)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| row.decode::<D>().map(|stored| (stored.id, stored)))
            .collect()
    }

    /// Insert a new document.
    pub async fn create<D: Document>(&self, doc: D) -> Result<Stored<D>, StoreError> {
        self.check_references(&doc, None).await?;

        let id = Uuid::now_v7();
        let now = chrono::Utc::now().timestamp();
        let data = serde_json::to_value(&doc)?;

        sqlx::query(
            r#"
            INSERT INTO document (id, collection, slug, published, weight, data, created, changed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(D::COLLECTION)
        .bind(doc.slug())
        .bind(doc.published())
        .bind(doc.weight())
        .bind(&data)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| slug_conflict(e, doc.slug()))?;

        debug!(collection = D::COLLECTION, %id, "document created");

        Ok(Stored {
            id,
            created: now,
            changed: now,
            doc,
        })
    }

    /// Replace a document. Returns `None` if it does not exist.
    pub async fn update<D: Document>(
        &self,
        id: Uuid,
        doc: D,
    ) -> Result<Option<Stored<D>>, StoreError> {
        self.check_references(&doc, Some(id)).await?;

        let now = chrono::Utc::now().timestamp();
        let data = serde_json::to_value(&doc)?;

        let created: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE document
            SET slug = $1, published = $2, weight = $3, data = $4, changed = $5
            WHERE id = $6 AND collection = $7
            RETURNING created
            "#,
        )
        .bind(doc.slug())
        .bind(doc.published())
        .bind(doc.weight())
        .bind(&data)
        .bind(now)
        .bind(id)
        .bind(D::COLLECTION)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| slug_conflict(e, doc.slug()))?;

        Ok(created.map(|created| Stored {
            id,
            created,
            changed: now,
            doc,
        }))
    }

    /// Delete a document. Returns false if it did not exist.
    pub async fn delete<D: Document>(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM document WHERE id = $1 AND collection = $2")
            .bind(id)
            .bind(D::COLLECTION)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn exists(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM document WHERE id = $1 AND collection = $2)",
        )
        .bind(id)
        .bind(collection)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn count(&self, collection: &str) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM document WHERE collection = $1")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// `(id, label)` pairs for a reference select box.
    pub async fn options(
        &self,
        collection: &str,
        label_field: &str,
    ) -> Result<Vec<(Uuid, String)>, StoreError> {
        let rows: Vec<(Uuid, Value)> = sqlx::query_as(
            "SELECT id, data FROM document WHERE collection = $1 ORDER BY weight, created DESC",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, data)| (id, label_of(&data, label_field)))
            .collect())
    }

    /// Every reference must point at an existing document, and never at
    /// the document itself.
    async fn check_references<D: Document>(
        &self,
        doc: &D,
        own_id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        for (field, collection, id) in doc.references() {
            let is_self = own_id == Some(id) && collection == D::COLLECTION;
            if is_self || !self.exists(collection, id).await? {
                return Err(StoreError::MissingReference {
                    field: field.to_string(),
                    id,
                });
            }
        }
        Ok(())
    }
}

/// Map a unique-index violation on `(collection, slug)` to [`StoreError::SlugTaken`].
fn slug_conflict(err: sqlx::Error, slug: Option<&str>) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_unique_violation()
        && let Some(slug) = slug
    {
        return StoreError::SlugTaken(slug.to_string());
    }
    StoreError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_query_build() {
        let query = ListQuery::new().published_only().page(2, 10);
        let sql = DocumentQueryBuilder::new("posts", &query).build();

        assert!(sql.contains("FROM \"document\""));
        assert!(sql.contains("\"collection\" = 'posts'"));
        assert!(sql.contains("\"published\" = TRUE"));
        assert!(sql.contains("ORDER BY \"weight\" ASC, \"created\" DESC"));
        assert!(sql.contains("LIMIT 10"));
        assert!(sql.contains("OFFSET 10"));
    }

    #[test]
    fn count_query_build() {
        let query = ListQuery::new();
        let sql = DocumentQueryBuilder::new("banners", &query).build_count();

        assert!(sql.contains("COUNT(*)"));
        assert!(sql.contains("'banners'"));
        assert!(!sql.contains("LIMIT"));
        assert!(!sql.contains("published"));
    }

    #[test]
    fn field_filter_binds_value() {
        let query = ListQuery::new().where_field("category", "x' OR '1'='1");
        let sql = DocumentQueryBuilder::new("posts", &query).build();

        assert!(sql.contains("\"data\" ->> 'category'"));
        // Quote in the value is escaped, not interpreted
        assert!(!sql.contains("OR '1'='1"));
    }

    #[test]
    fn invalid_filter_field_matches_nothing() {
        let query = ListQuery::new().where_field("data'; DROP TABLE document; --", "x");
        let sql = DocumentQueryBuilder::new("posts", &query).build();

        assert!(sql.contains("FALSE"));
        assert!(!sql.contains("DROP"));
    }

    #[test]
    fn page_bounds_are_clamped() {
        let query = ListQuery::new().page(0, 10_000);
        assert_eq!(query.bounds(), (1, MAX_PER_PAGE));

        let sql = DocumentQueryBuilder::new("posts", &query).build();
        assert!(sql.contains("OFFSET 0"));
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let query = ListQuery::new().page(u32::MAX, MAX_PER_PAGE);
        let sql = DocumentQueryBuilder::new("posts", &query).build();
        let offset = u64::from(u32::MAX - 1) * u64::from(MAX_PER_PAGE);
        assert!(sql.contains(&format!("OFFSET {offset}")), "{sql}");
    }

    #[test]
    fn field_names() {
        assert!(is_valid_field_name("category"));
        assert!(is_valid_field_name("case_type"));
        assert!(!is_valid_field_name("Category"));
        assert!(!is_valid_field_name(""));
        assert!(!is_valid_field_name("a-b"));
    }

    #[test]
    fn labels_prefer_english() {
        let data = json!({"name": {"en": "Tax", "vi": "Thuế"}, "author": "Ms. Lan"});
        assert_eq!(label_of(&data, "name"), "Tax");
        assert_eq!(label_of(&data, "author"), "Ms. Lan");
        assert_eq!(label_of(&data, "missing"), "");
    }
}
