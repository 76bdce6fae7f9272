//! Read side: toy lookups.

use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug};

use crate::error::{ToyBoxError, ToyBoxResult};
use crate::logging::operation_span;
use crate::metrics::METRICS;
use crate::model::ToyRecord;
use crate::store::{DocumentStore, TOYS_COLLECTION};

/// Looks toys up by id. Never writes.
#[derive(Clone)]
pub struct ToyQueryProcessor {
    store: Arc<dyn DocumentStore>,
}

impl ToyQueryProcessor {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Fetch a toy by id.
    ///
    /// # Errors
    /// `NotFound` ("Toy {toy_id} not found") when no toy has this id,
    /// `Internal` when the store fails or the stored toy is not a valid record.
    pub async fn get_toy(&self, toy_id: &str) -> ToyBoxResult<ToyRecord> {
        let started = Instant::now();
        let result = self
            .find_toy(toy_id)
            .instrument(operation_span("get_toy", toy_id))
            .await;

        match &result {
            Ok(_) => METRICS.record_success("get_toy", started.elapsed()),
            Err(error) => {
                debug!(toy_id, %error, "toy lookup failed");
                METRICS.record_failure("get_toy", started.elapsed(), error.error_type());
            }
        }
        result
    }

    async fn find_toy(&self, toy_id: &str) -> ToyBoxResult<ToyRecord> {
        let document = self
            .store
            .get_item(TOYS_COLLECTION, "toy_id", toy_id)
            .await?
            .ok_or_else(|| ToyBoxError::not_found(format!("Toy {toy_id} not found")))?;

        ToyRecord::from_document(document).map_err(|error| {
            ToyBoxError::internal(format!("stored toy {toy_id} is not a valid record: {error}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Document, InMemoryDocumentStore};
    use assert_matches::assert_matches;
    use serde_json::json;

    fn stored_toy() -> Document {
        json!({
            "toy_id": "JP101",
            "owner_id": "super_mom492",
            "coordinates": "18.458,77.235",
            "name": "IntelliSkills Jungle Animals Stick Puzzle",
            "mrp": 0.0,
            "description": "18-pc puzzles, 6 animals, suitable for 3+ kids",
            "images": [],
            "weight": "0.28kg",
            "features": [],
            "recommended_age": "3+",
            "dimensions": "12X12X34",
            "brand": "IntelliSkills",
            "available": true,
            "rating": 4.8,
            "review_count": 1.0
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn processor(store: InMemoryDocumentStore) -> ToyQueryProcessor {
        ToyQueryProcessor::new(Arc::new(store))
    }

    #[tokio::test]
    async fn get_toy_returns_stored_fields() {
        let queries = processor(InMemoryDocumentStore::new().with_documents("toys", [stored_toy()]));

        let toy = queries.get_toy("JP101").await.unwrap();

        assert_eq!(serde_json::to_value(&toy).unwrap(), json!(stored_toy()));
    }

    #[tokio::test]
    async fn get_toy_missing_is_not_found() {
        let queries = processor(InMemoryDocumentStore::new());

        let error = queries.get_toy("JP109").await.unwrap_err();

        assert_eq!(error.to_string(), "Toy JP109 not found");
        assert_matches!(error, ToyBoxError::NotFound { code: 404, .. });
    }

    #[tokio::test]
    async fn get_toy_with_corrupt_document_is_internal() {
        let mut corrupt = stored_toy();
        corrupt.insert("name".into(), json!(""));
        let queries = processor(InMemoryDocumentStore::new().with_documents("toys", [corrupt]));

        let error = queries.get_toy("JP101").await.unwrap_err();

        assert_matches!(error, ToyBoxError::Internal(_));
    }
}
