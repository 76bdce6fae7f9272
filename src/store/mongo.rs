//! MongoDB-backed document store.

use async_trait::async_trait;
use mongodb::{
    Client, Database,
    bson::{self, Bson, Document as BsonDocument, doc},
};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{Document, DocumentStore, InsertReceipt, StoreError, StoreResult};

pub const DEFAULT_DATABASE: &str = "toybox";

/// Where the MongoDB server lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    /// How long the driver waits for a reachable server; driver default when unset
    pub server_selection_timeout: Option<Duration>,
}

impl MongoSettings {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            database: DEFAULT_DATABASE.to_string(),
            server_selection_timeout: None,
        }
    }

    pub fn with_server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = Some(timeout);
        self
    }

    pub fn uri(&self) -> String {
        match self.server_selection_timeout {
            Some(timeout) => format!(
                "mongodb://{}:{}/?serverSelectionTimeoutMS={}",
                self.host,
                self.port,
                timeout.as_millis()
            ),
            None => format!("mongodb://{}:{}", self.host, self.port),
        }
    }
}

/// Store adapter over a MongoDB database.
///
/// The client is created on the first operation and reused afterwards.
#[derive(Debug)]
pub struct MongoDocumentStore {
    settings: MongoSettings,
    client: OnceCell<Client>,
}

impl MongoDocumentStore {
    pub fn new(settings: MongoSettings) -> Self {
        Self {
            settings,
            client: OnceCell::new(),
        }
    }

    /// Whether a client has been created yet
    pub fn is_connected(&self) -> bool {
        self.client.initialized()
    }

    async fn database(&self) -> StoreResult<Database> {
        let client = self
            .client
            .get_or_try_init(|| async {
                info!(
                    host = %self.settings.host,
                    port = self.settings.port,
                    database = %self.settings.database,
                    "connecting to document store"
                );
                Client::with_uri_str(self.settings.uri()).await
            })
            .await?;
        Ok(client.database(&self.settings.database))
    }
}

fn equality_filter(key: &str, value: &str) -> BsonDocument {
    let mut filter = BsonDocument::new();
    filter.insert(key, value);
    filter
}

fn to_bson(document: &Document) -> StoreResult<BsonDocument> {
    bson::to_document(document).map_err(|error| StoreError::Encoding(error.to_string()))
}

/// Convert a stored document back to JSON, dropping the store's `_id`.
fn from_bson(mut document: BsonDocument) -> StoreResult<Document> {
    document.remove("_id");
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Encoding(format!(
            "expected a document, got {other}"
        ))),
    }
}

fn inserted_id_string(id: Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(text) => text,
        other => other.to_string(),
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn get_item(
        &self,
        collection: &str,
        key: &str,
        value: &str,
    ) -> StoreResult<Option<Document>> {
        let found = self
            .database()
            .await?
            .collection::<BsonDocument>(collection)
            .find_one(equality_filter(key, value))
            .await?;
        found.map(from_bson).transpose()
    }

    async fn add_item(&self, collection: &str, document: Document) -> StoreResult<InsertReceipt> {
        let result = self
            .database()
            .await?
            .collection::<BsonDocument>(collection)
            .insert_one(to_bson(&document)?)
            .await?;
        Ok(InsertReceipt {
            inserted_id: inserted_id_string(result.inserted_id),
        })
    }

    async fn update_item(
        &self,
        collection: &str,
        key: &str,
        value: &str,
        patch: Document,
    ) -> StoreResult<Document> {
        debug!(collection, key, value, ?patch, "updating document");
        let result = self
            .database()
            .await?
            .collection::<BsonDocument>(collection)
            .update_one(equality_filter(key, value), doc! { "$set": to_bson(&patch)? })
            .await?;
        if result.matched_count == 0 {
            debug!(collection, key, value, "update matched no document");
        }
        Ok(patch)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.database()
            .await?
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn settings_build_connection_uri() {
        let settings = MongoSettings::new("localhost", 27017);
        assert_eq!(settings.uri(), "mongodb://localhost:27017");
        assert_eq!(settings.database, "toybox");

        let bounded = settings.with_server_selection_timeout(Duration::from_millis(250));
        assert_eq!(
            bounded.uri(),
            "mongodb://localhost:27017/?serverSelectionTimeoutMS=250"
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_reported_unavailable() {
        // Nothing listens on port 1; server selection gives up after the timeout.
        let settings = MongoSettings::new("127.0.0.1", 1)
            .with_server_selection_timeout(Duration::from_millis(200));
        let store = MongoDocumentStore::new(settings);

        let error = store.ping().await.unwrap_err();

        assert!(
            matches!(error, StoreError::Unavailable(_)),
            "unexpected error {error:?}"
        );
        assert!(store.is_connected());
    }

    #[test]
    fn client_is_not_created_until_first_use() {
        let store = MongoDocumentStore::new(MongoSettings::new("localhost", 27017));
        assert!(!store.is_connected());
        assert_eq!(store.backend_name(), "mongodb");
    }

    #[test]
    fn json_documents_survive_bson_conversion() {
        let document = json!({
            "toy_id": "JP201",
            "available": true,
            "mrp": 150.5,
            "images": ["a.png", "b.png"],
        })
        .as_object()
        .cloned()
        .unwrap();

        let mut encoded = to_bson(&document).unwrap();
        encoded.insert("_id", bson::oid::ObjectId::new());
        let decoded = from_bson(encoded).unwrap();

        assert_eq!(decoded, document);
    }

    #[test]
    fn equality_filter_uses_field_name() {
        let filter = equality_filter("user_id", "user123");
        assert_eq!(filter.get_str("user_id").unwrap(), "user123");
    }
}
