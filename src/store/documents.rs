//! Document Repository
//!
//! JSONB document collections over the shared pool. Every write goes through
//! the `documents` table, whose trigger publishes the change notification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::StoreError;

/// Document collections held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Products,
    Categories,
    Users,
    Orders,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Products,
        Collection::Categories,
        Collection::Users,
        Collection::Orders,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Categories => "categories",
            Collection::Users => "users",
            Collection::Orders => "orders",
        }
    }
}

/// Stored document
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Document {
    pub id: Uuid,
    pub collection: String,
    pub body: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// The body with the document id added as `id`
    pub fn to_json(&self) -> Value {
        let mut body = self.body.clone();
        if let Value::Object(ref mut fields) = body {
            fields.insert("id".to_string(), Value::String(self.id.to_string()));
        }
        body
    }
}

/// Filter for [`DocumentStore::find`]
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    /// Match documents whose body contains this JSON object
    pub contains: Option<Value>,
    /// Match documents whose top-level text field is one of the values
    pub field_in: Option<(String, Vec<String>)>,
    pub limit: Option<i64>,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(mut self, fragment: Value) -> Self {
        self.contains = Some(fragment);
        self
    }

    pub fn field_in(mut self, field: impl Into<String>, values: Vec<String>) -> Self {
        self.field_in = Some((field.into(), values));
        self
    }

    /// Cap the number of results. Zero means no cap; the sign is ignored.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = match limit.checked_abs() {
            Some(0) => None,
            Some(n) => Some(n),
            None => Some(i64::MAX),
        };
        self
    }
}

const DOCUMENT_COLUMNS: &str = "id, collection, body, created_at, updated_at";

/// Repository over the `documents` table
#[derive(Debug, Clone)]
pub struct DocumentStore {
    pool: PgPool,
}

impl DocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new document with a generated id
    pub async fn insert(&self, collection: Collection, body: Value) -> Result<Document, StoreError> {
        ensure_object(&body)?;

        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            INSERT INTO documents (collection, id, body, write_kind)
            VALUES ($1, $2, $3, 'insert')
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(collection.as_str())
        .bind(Uuid::new_v4())
        .bind(&body)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            collection = collection.as_str(),
            document_id = %document.id,
            "Inserted document"
        );

        Ok(document)
    }

    pub async fn find_by_id(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<Document>, StoreError> {
        let document = sqlx::query_as::<_, Document>(&format!(
            "SELECT {} FROM documents WHERE collection = $1 AND id = $2",
            DOCUMENT_COLUMNS
        ))
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    pub async fn find_by_ids(
        &self,
        collection: Collection,
        ids: &[Uuid],
    ) -> Result<Vec<Document>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let documents = sqlx::query_as::<_, Document>(&format!(
            "SELECT {} FROM documents WHERE collection = $1 AND id = ANY($2)",
            DOCUMENT_COLUMNS
        ))
        .bind(collection.as_str())
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    /// List documents in insertion order
    pub async fn find(
        &self,
        collection: Collection,
        query: &DocumentQuery,
    ) -> Result<Vec<Document>, StoreError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM documents WHERE collection = ",
            DOCUMENT_COLUMNS
        ));
        builder.push_bind(collection.as_str());

        if let Some(fragment) = &query.contains {
            builder.push(" AND body @> ").push_bind(fragment.clone());
        }

        if let Some((field, values)) = &query.field_in {
            builder
                .push(" AND body ->> ")
                .push_bind(field.clone())
                .push(" = ANY(")
                .push_bind(values.clone())
                .push(")");
        }

        builder.push(" ORDER BY created_at, id");

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }

        let documents = builder
            .build_query_as::<Document>()
            .fetch_all(&self.pool)
            .await?;

        Ok(documents)
    }

    /// Merge `patch` into the stored body (top-level keys overwrite)
    pub async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Value,
    ) -> Result<Option<Document>, StoreError> {
        ensure_object(&patch)?;

        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET body = body || $3, write_kind = 'update', updated_at = NOW()
            WHERE collection = $1 AND id = $2
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(collection.as_str())
        .bind(id)
        .bind(&patch)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    /// Replace the whole body
    pub async fn replace(
        &self,
        collection: Collection,
        id: Uuid,
        body: Value,
    ) -> Result<Option<Document>, StoreError> {
        ensure_object(&body)?;

        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET body = $3, write_kind = 'replace', updated_at = NOW()
            WHERE collection = $1 AND id = $2
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(collection.as_str())
        .bind(id)
        .bind(&body)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    /// Delete a document, returning whether it existed
    pub async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self, collection: Collection) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = $1")
            .bind(collection.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn ensure_object(body: &Value) -> Result<(), StoreError> {
    if body.is_object() {
        Ok(())
    } else {
        Err(StoreError::InvalidDocument(
            "document body must be a JSON object".to_string(),
        ))
    }
}
