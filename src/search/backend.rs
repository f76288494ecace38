// src/search/backend.rs

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::search::request::{SearchRequest, SearchResponse};
use crate::store::{CollectionName, DocumentStore};

/// The searchable store the query engine reads from.
///
/// Responses are untyped so remote and embedded stores share one wire shape;
/// the engine decodes hits into its own document types.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Short name used in logs.
    fn backend_tag(&self) -> &'static str;

    async fn search(
        &self,
        collection: CollectionName,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError>;
}

/// Searches the in-process [`DocumentStore`].
#[derive(Clone)]
pub struct EmbeddedBackend {
    store: Arc<DocumentStore>,
}

impl EmbeddedBackend {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SearchBackend for EmbeddedBackend {
    fn backend_tag(&self) -> &'static str {
        "embedded"
    }

    async fn search(
        &self,
        collection: CollectionName,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError> {
        self.store.search_json(collection, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::leaderboard::tests::sample_entry;

    #[tokio::test]
    async fn test_embedded_backend_projects_fields() {
        let store = Arc::new(DocumentStore::new());
        store.leaderboard().upsert(sample_entry("s1", 10)).await.unwrap();

        let backend = EmbeddedBackend::new(store);
        let response = backend
            .search(
                CollectionName::Leaderboard,
                &SearchRequest::new("*").include_fields(&["student_id"]),
            )
            .await
            .unwrap();

        assert_eq!(backend.backend_tag(), "embedded");
        assert_eq!(response.found, 1);
        assert_eq!(response.hits[0].document, serde_json::json!({"student_id": "s1"}));
    }
}
