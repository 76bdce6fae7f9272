//! In-process document store backed by a map of collections.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::{Document, DocumentStore, InsertReceipt, StoreResult, field_matches};

/// Thread-safe in-memory store.
///
/// Each call takes the lock once, so single operations are atomic but a
/// read followed by a write from a caller is not.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style preload used by fixtures and tests.
    pub fn with_documents(self, collection: &str, documents: impl IntoIterator<Item = Document>) -> Self {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
        self
    }

    /// Number of documents currently held in `collection`
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Every document in `collection`, in insertion order
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_item(
        &self,
        collection: &str,
        key: &str,
        value: &str,
    ) -> StoreResult<Option<Document>> {
        let collections = self.collections.read();
        Ok(collections.get(collection).and_then(|documents| {
            documents
                .iter()
                .find(|document| field_matches(document, key, value))
                .cloned()
        }))
    }

    async fn add_item(&self, collection: &str, document: Document) -> StoreResult<InsertReceipt> {
        let inserted_id = Uuid::new_v4().simple().to_string();
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(document);
        debug!(collection, inserted_id = %inserted_id, "document inserted");
        Ok(InsertReceipt { inserted_id })
    }

    async fn update_item(
        &self,
        collection: &str,
        key: &str,
        value: &str,
        patch: Document,
    ) -> StoreResult<Document> {
        let mut collections = self.collections.write();
        let target = collections.get_mut(collection).and_then(|documents| {
            documents
                .iter_mut()
                .find(|document| field_matches(document, key, value))
        });

        match target {
            Some(document) => {
                for (field, new_value) in &patch {
                    document.insert(field.clone(), new_value.clone());
                }
            }
            None => debug!(collection, key, value, "update matched no document"),
        }
        Ok(patch)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().expect("object literal")
    }

    #[tokio::test]
    async fn get_item_returns_first_match_or_none() {
        let store = InMemoryDocumentStore::new().with_documents(
            "toys",
            [
                doc(json!({ "toy_id": "JP201", "name": "Teddy" })),
                doc(json!({ "toy_id": "JP201", "name": "Duplicate" })),
            ],
        );

        let found = store.get_item("toys", "toy_id", "JP201").await.unwrap();
        assert_eq!(found.unwrap()["name"], "Teddy");

        let missing = store.get_item("toys", "toy_id", "JP999").await.unwrap();
        assert!(missing.is_none());

        let other_collection = store.get_item("users", "toy_id", "JP201").await.unwrap();
        assert!(other_collection.is_none());
    }

    #[tokio::test]
    async fn add_item_stores_verbatim_and_returns_handle() {
        let store = InMemoryDocumentStore::new();
        let document = doc(json!({ "toy_id": "JP300", "images": ["a.png"] }));

        let receipt = store.add_item("toys", document.clone()).await.unwrap();
        assert!(!receipt.inserted_id.is_empty());
        assert_eq!(store.documents("toys"), vec![document]);
    }

    #[tokio::test]
    async fn update_item_merges_patch_and_keeps_other_fields() {
        let store = InMemoryDocumentStore::new().with_documents(
            "toys",
            [doc(json!({ "toy_id": "JP201", "name": "Teddy", "available": true }))],
        );

        let patch = doc(json!({ "available": false, "owner_id": "user123" }));
        let applied = store
            .update_item("toys", "toy_id", "JP201", patch.clone())
            .await
            .unwrap();
        assert_eq!(applied, patch);

        let stored = store.get_item("toys", "toy_id", "JP201").await.unwrap().unwrap();
        assert_eq!(stored["name"], "Teddy");
        assert_eq!(stored["available"], false);
        assert_eq!(stored["owner_id"], "user123");
    }

    #[tokio::test]
    async fn update_item_without_match_is_silent_noop() {
        let store = InMemoryDocumentStore::new()
            .with_documents("toys", [doc(json!({ "toy_id": "JP201" }))]);

        let patch = doc(json!({ "available": false }));
        let applied = store
            .update_item("toys", "toy_id", "JP999", patch.clone())
            .await
            .unwrap();

        assert_eq!(applied, patch);
        assert_eq!(store.documents("toys"), vec![doc(json!({ "toy_id": "JP201" }))]);
    }
}
