//! Document store abstraction
//!
//! Persistence sits behind [`DocumentStore`]: a collection-addressed store with
//! field-equality lookup. Processors receive the store as an injected
//! `Arc<dyn DocumentStore>` and never hold records beyond one operation.
//!
//! Two backends exist:
//! - [`MongoDocumentStore`] for deployments, connecting lazily on first use
//! - [`InMemoryDocumentStore`] for development runs and tests

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod memory;
pub mod mongo;

pub use memory::InMemoryDocumentStore;
pub use mongo::MongoDocumentStore;

/// Collection holding toy listings, keyed by `toy_id`
pub const TOYS_COLLECTION: &str = "toys";
/// Collection holding users, keyed by `user_id`
pub const USERS_COLLECTION: &str = "users";

/// A schema-free document as exchanged with the store
pub type Document = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No server answered within the selection timeout
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("document encoding failed: {0}")]
    Encoding(String),

    #[error(transparent)]
    Mongo(mongodb::error::Error),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(error: mongodb::error::Error) -> Self {
        if matches!(*error.kind, mongodb::error::ErrorKind::ServerSelection { .. }) {
            StoreError::Unavailable(error.to_string())
        } else {
            StoreError::Mongo(error)
        }
    }
}

/// Acknowledgement returned by [`DocumentStore::add_item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertReceipt {
    /// Store-assigned handle for the inserted document
    pub inserted_id: String,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// First document in `collection` whose field `key` equals `value`.
    async fn get_item(&self, collection: &str, key: &str, value: &str)
    -> StoreResult<Option<Document>>;

    /// Insert `document` verbatim.
    async fn add_item(&self, collection: &str, document: Document) -> StoreResult<InsertReceipt>;

    /// Merge `patch` into the first document matching `key == value` and return
    /// the patch. Nothing happens when no document matches.
    async fn update_item(
        &self,
        collection: &str,
        key: &str,
        value: &str,
        patch: Document,
    ) -> StoreResult<Document>;

    /// Cheap round trip used by readiness checks.
    async fn ping(&self) -> StoreResult<()>;

    /// Short backend name for logs and health output
    fn backend_name(&self) -> &'static str;
}

/// Serialise a record into a store document.
pub fn to_document<T: Serialize>(record: &T) -> StoreResult<Document> {
    match serde_json::to_value(record) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(other) => Err(StoreError::Encoding(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(error) => Err(StoreError::Encoding(error.to_string())),
    }
}

/// Whether `document` has a string field `key` equal to `value`.
pub(crate) fn field_matches(document: &Document, key: &str, value: &str) -> bool {
    document.get(key).and_then(Value::as_str) == Some(value)
}
