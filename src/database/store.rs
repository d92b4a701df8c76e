use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::types::Json;
use uuid::Uuid;

use super::manager::{DataAccess, DatabaseError};

/// A schema-less JSON record
pub type Document = Map<String, Value>;

/// Field assigned by the store to every inserted document
pub const DOCUMENT_ID_FIELD: &str = "_id";

/// Collection-oriented document storage.
///
/// Lookups by field compare the field's text rendering against `value`, so
/// a numeric `3` matches the path segment `"3"`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document, returning the id the store assigned
    async fn insert(&self, collection: &str, document: Document) -> Result<Uuid, DatabaseError>;

    /// Insert several documents as one unit; either all are stored or none
    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<Vec<Uuid>, DatabaseError>;

    /// All documents of a collection in insertion order
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, DatabaseError>;

    /// First document (by insertion order) whose `field` matches `value`
    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, DatabaseError>;

    /// Remove every document whose `field` matches `value`
    async fn delete_where(&self, collection: &str, field: &str, value: &str) -> Result<u64, DatabaseError>;

    async fn count(&self, collection: &str) -> Result<u64, DatabaseError>;

    /// Cheap round trip used by the health endpoint
    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// Text rendering of a field value used for id matching
pub fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // objects and arrays never match a path segment
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Stamp a fresh store id onto the document
pub fn assign_id(document: &mut Document) -> Uuid {
    let id = Uuid::new_v4();
    document.insert(DOCUMENT_ID_FIELD.to_string(), Value::String(id.to_string()));
    id
}

/// Documents kept as JSONB rows of a single `documents` table
pub struct PgDocumentStore {
    access: Arc<DataAccess>,
}

impl PgDocumentStore {
    pub fn new(access: Arc<DataAccess>) -> Self {
        Self { access }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, collection: &str, mut document: Document) -> Result<Uuid, DatabaseError> {
        let pool = self.access.connect().await?;
        let id = assign_id(&mut document);

        sqlx::query("INSERT INTO documents (id, collection, body) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(collection)
            .bind(Json(Value::Object(document)))
            .execute(pool)
            .await?;

        Ok(id)
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<Vec<Uuid>, DatabaseError> {
        let pool = self.access.connect().await?;
        let mut tx = pool.begin().await?;
        let mut ids = Vec::with_capacity(documents.len());

        for mut document in documents {
            let id = assign_id(&mut document);
            sqlx::query("INSERT INTO documents (id, collection, body) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(collection)
                .bind(Json(Value::Object(document)))
                .execute(&mut *tx)
                .await?;
            ids.push(id);
        }

        // dropping tx without commit rolls back
        tx.commit().await?;
        Ok(ids)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, DatabaseError> {
        let pool = self.access.connect().await?;

        let rows: Vec<Json<Document>> =
            sqlx::query_scalar("SELECT body FROM documents WHERE collection = $1 ORDER BY seq")
                .bind(collection)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().map(|Json(doc)| doc).collect())
    }

    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, DatabaseError> {
        let pool = self.access.connect().await?;

        // ->> renders numbers and booleans as text, matching field_text
        let row: Option<Json<Document>> = sqlx::query_scalar(
            "SELECT body FROM documents WHERE collection = $1 AND body ->> $2 = $3 ORDER BY seq LIMIT 1",
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|Json(doc)| doc))
    }

    async fn delete_where(&self, collection: &str, field: &str, value: &str) -> Result<u64, DatabaseError> {
        let pool = self.access.connect().await?;

        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND body ->> $2 = $3")
            .bind(collection)
            .bind(field)
            .bind(value)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count(&self, collection: &str) -> Result<u64, DatabaseError> {
        let pool = self.access.connect().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = $1")
            .bind(collection)
            .fetch_one(pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        let pool = self.access.connect().await?;
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}
