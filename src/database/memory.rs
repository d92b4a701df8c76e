use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::store::{assign_id, field_text, Document, DocumentStore};

/// In-process document store, selected with `DATABASE_URL=memory:`
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(document: &Document, field: &str, value: &str) -> bool {
    document
        .get(field)
        .and_then(field_text)
        .is_some_and(|text| text == value)
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, mut document: Document) -> Result<Uuid, DatabaseError> {
        let id = assign_id(&mut document);
        let mut collections = self.collections.write().await;
        collections.entry(collection.to_string()).or_default().push(document);
        Ok(id)
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<Vec<Uuid>, DatabaseError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        let mut ids = Vec::with_capacity(documents.len());
        for mut document in documents {
            ids.push(assign_id(&mut document));
            docs.push(document);
        }
        Ok(ids)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| matches(doc, field, value)))
            .cloned())
    }

    async fn delete_where(&self, collection: &str, field: &str, value: &str) -> Result<u64, DatabaseError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|doc| !matches(doc, field, value));
        Ok((before - docs.len()) as u64)
    }

    async fn count(&self, collection: &str) -> Result<u64, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map_or(0, |docs| docs.len() as u64))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order() {
        let store = MemoryDocumentStore::new();
        store.insert("quotes", doc(json!({"quoteID": 2}))).await.unwrap();
        store.insert("quotes", doc(json!({"quoteID": 1}))).await.unwrap();

        let all = store.find_all("quotes").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0]["quoteID"], json!(2));
        assert_eq!(all[1]["quoteID"], json!(1));
        assert!(all.iter().all(|d| d.contains_key("_id")));
    }

    #[tokio::test]
    async fn find_one_matches_numbers_by_text() {
        let store = MemoryDocumentStore::new();
        store.insert("journals", doc(json!({"journalID": 7, "title": "a"}))).await.unwrap();

        let found = store.find_one("journals", "journalID", "7").await.unwrap();
        assert_eq!(found.unwrap()["title"], json!("a"));
        assert!(store.find_one("journals", "journalID", "8").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_one_returns_first_of_duplicates() {
        let store = MemoryDocumentStore::new();
        store.insert("moods", doc(json!({"entryID": "x", "n": 1}))).await.unwrap();
        store.insert("moods", doc(json!({"entryID": "x", "n": 2}))).await.unwrap();

        let found = store.find_one("moods", "entryID", "x").await.unwrap().unwrap();
        assert_eq!(found["n"], json!(1));
    }

    #[tokio::test]
    async fn delete_where_leaves_other_documents() {
        let store = MemoryDocumentStore::new();
        store.insert("journalentries", doc(json!({"entryID": "a"}))).await.unwrap();
        store.insert("journalentries", doc(json!({"entryID": "b"}))).await.unwrap();

        assert_eq!(store.delete_where("journalentries", "entryID", "a").await.unwrap(), 1);
        assert_eq!(store.delete_where("journalentries", "entryID", "zzz").await.unwrap(), 0);
        assert_eq!(store.delete_where("missing", "entryID", "a").await.unwrap(), 0);

        let rest = store.find_all("journalentries").await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0]["entryID"], json!("b"));
    }

    #[tokio::test]
    async fn insert_many_appends_in_order() {
        let store = MemoryDocumentStore::new();
        store.insert("playlists", doc(json!({"playlistID": "p0"}))).await.unwrap();
        let ids = store
            .insert_many(
                "playlists",
                vec![doc(json!({"playlistID": "p1"})), doc(json!({"playlistID": "p2"}))],
            )
            .await
            .unwrap();

        assert_eq!(ids.len(), 2);
        let all = store.find_all("playlists").await.unwrap();
        let order: Vec<_> = all.iter().map(|d| d["playlistID"].clone()).collect();
        assert_eq!(order, vec![json!("p0"), json!("p1"), json!("p2")]);
        assert_eq!(all[2]["_id"], json!(ids[1].to_string()));
    }

    #[tokio::test]
    async fn collections_are_independent() {
        let store = MemoryDocumentStore::new();
        store.insert("quotes", doc(json!({"quoteID": 1}))).await.unwrap();

        assert_eq!(store.count("quotes").await.unwrap(), 1);
        assert_eq!(store.count("exercises").await.unwrap(), 0);
    }
}
