// src/search/remote.rs

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::config::Config;
use crate::error::StoreError;
use crate::search::backend::SearchBackend;
use crate::search::request::{SearchRequest, SearchResponse};
use crate::store::CollectionName;
use crate::utils::api_key::API_KEY_HEADER;

/// Talks to a search store over HTTP using the collection search API:
/// `GET {base}/collections/{name}/documents/search?q=..&filter_by=..`.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
    api_key: String,
}

impl HttpBackend {
    pub fn new(client: Client, base: Url, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base,
            api_key: api_key.into(),
        }
    }

    /// Builds a client with the configured connect and request timeouts.
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let base = config.remote_endpoint()?;
        let api_key = config
            .search_api_key
            .clone()
            .ok_or_else(|| StoreError::Configuration("SEARCH_API_KEY is not set".to_string()))?;

        let client = Client::builder()
            .connect_timeout(config.request_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| StoreError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::new(client, base, api_key))
    }

    fn search_url(&self, collection: CollectionName) -> Result<Url, StoreError> {
        self.base
            .join(&format!("collections/{}/documents/search", collection))
            .map_err(|e| StoreError::Configuration(format!("invalid search endpoint: {}", e)))
    }
}

#[async_trait]
impl SearchBackend for HttpBackend {
    fn backend_tag(&self) -> &'static str {
        "http"
    }

    async fn search(
        &self,
        collection: CollectionName,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError> {
        let url = self.search_url(collection)?;
        tracing::debug!("GET {} q={:?}", url, request.q);

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Retrieval(format!(
                "search store answered {}: {}",
                status, body
            )));
        }

        Ok(response.json::<SearchResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendMode;

    #[test]
    fn test_from_config_requires_credentials() {
        let config = Config {
            backend_mode: BackendMode::Remote,
            search_host: Some("search.example.com".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            HttpBackend::from_config(&config),
            Err(StoreError::Configuration(_))
        ));
    }

    #[test]
    fn test_search_url_per_collection() {
        let config = Config {
            backend_mode: BackendMode::Remote,
            search_host: Some("search.example.com".to_string()),
            search_port: 8108,
            search_protocol: "http".to_string(),
            search_api_key: Some("key".to_string()),
            ..Config::default()
        };
        let backend = HttpBackend::from_config(&config).unwrap();

        assert_eq!(
            backend.search_url(CollectionName::Leaderboard).unwrap().as_str(),
            "http://search.example.com:8108/collections/leaderboard/documents/search"
        );
    }
}
