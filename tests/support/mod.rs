#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use toybox::store::{
    Document, DocumentStore, InMemoryDocumentStore, InsertReceipt, StoreError, StoreResult,
};
use toybox::{AppState, ToyCommandProcessor, ToyIdGenerator, ToyRecord};

/// Client-side body for a new toy (no id yet)
pub fn teddy_json() -> Value {
    json!({
        "owner_id": "m1",
        "coordinates": "1,1",
        "name": "Teddy",
        "description": "Soft brown bear",
        "images": ["https://img.example/teddy.png"],
        "weight": "0.3kg",
        "features": ["washable", "hypoallergenic"],
        "recommended_age": "3+",
        "dimensions": "10X10X25",
        "brand": "Cuddles",
        "available": true,
        "rating": 4.5,
        "review_count": 12.0
    })
}

pub fn teddy() -> ToyRecord {
    ToyRecord::from_value(teddy_json()).expect("valid teddy")
}

/// Stored toy JP201, available, listed by m1
pub fn stored_toy(toy_id: &str) -> Document {
    let mut document = teddy_json().as_object().cloned().expect("object");
    document.insert("toy_id".into(), json!(toy_id));
    document.insert("mrp".into(), json!(99.0));
    document
}

pub fn buyer(user_id: &str, coordinates: &str) -> Document {
    json!({
        "user_id": user_id,
        "coordinates": coordinates,
        "first_name": "Ada",
        "last_name": "Byron",
        "phone_number": "555-0100",
        "address": "1 Toy Lane"
    })
    .as_object()
    .cloned()
    .expect("object")
}

/// Ids handed out in order, cycling.
pub struct SequentialIds {
    ids: Vec<String>,
    next: AtomicUsize,
}

impl SequentialIds {
    pub fn new(ids: &[&str]) -> Self {
        Self {
            ids: ids.iter().map(|id| id.to_string()).collect(),
            next: AtomicUsize::new(0),
        }
    }
}

impl ToyIdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.ids.len();
        self.ids[index].clone()
    }
}

/// Which store operations should fail
#[derive(Debug, Default, Clone, Copy)]
pub struct Failures {
    pub get: bool,
    pub add: bool,
    pub update: bool,
}

/// Memory store that fails selected operations.
pub struct FlakyStore {
    inner: InMemoryDocumentStore,
    failures: Failures,
}

impl FlakyStore {
    pub fn new(inner: InMemoryDocumentStore, failures: Failures) -> Self {
        Self { inner, failures }
    }

    pub fn inner(&self) -> &InMemoryDocumentStore {
        &self.inner
    }
}

fn outage() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get_item(
        &self,
        collection: &str,
        key: &str,
        value: &str,
    ) -> StoreResult<Option<Document>> {
        if self.failures.get {
            return Err(outage());
        }
        self.inner.get_item(collection, key, value).await
    }

    async fn add_item(&self, collection: &str, document: Document) -> StoreResult<InsertReceipt> {
        if self.failures.add {
            return Err(outage());
        }
        self.inner.add_item(collection, document).await
    }

    async fn update_item(
        &self,
        collection: &str,
        key: &str,
        value: &str,
        patch: Document,
    ) -> StoreResult<Document> {
        if self.failures.update {
            return Err(outage());
        }
        self.inner.update_item(collection, key, value, patch).await
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.failures.get {
            return Err(outage());
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

/// App state over `store` with deterministic ids.
pub fn app_state(store: Arc<dyn DocumentStore>, ids: &[&str]) -> AppState {
    let commands =
        ToyCommandProcessor::new(store.clone()).with_id_generator(Arc::new(SequentialIds::new(ids)));
    AppState::new(store).with_commands(commands)
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}
