use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Hits requested per query, matching what the dictionary page renders.
const HITS_PER_PAGE: u32 = 10;

/// One dictionary entry as the hosted index returns it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub kanji: String,
    #[serde(default)]
    pub reading: String,
    #[serde(default)]
    pub sense: String,
}

/// Read-side seam over the hosted search index.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Runs one query against the index.
    ///
    /// # Errors
    ///
    /// Returns `SearchError` when the client is unconfigured or the request
    /// fails.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub base_url: String,
    pub app_id: String,
    pub api_key: String,
    pub index: String,
}

impl SearchConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let app_id = env::var("NIHONGO_SEARCH_APP_ID").ok()?;
        if app_id.trim().is_empty() {
            return None;
        }
        let api_key = env::var("NIHONGO_SEARCH_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let index = env::var("NIHONGO_SEARCH_INDEX")
            .unwrap_or_else(|_| "jmdictdictionary".into());
        let base_url = env::var("NIHONGO_SEARCH_URL")
            .unwrap_or_else(|_| format!("https://{}-dsn.algolia.net", app_id.to_lowercase()));
        Some(Self {
            base_url,
            app_id,
            api_key,
            index,
        })
    }
}

#[derive(Clone)]
pub struct HostedSearchClient {
    client: Client,
    config: Option<SearchConfig>,
}

impl HostedSearchClient {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(SearchConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<SearchConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl SearchClient for HostedSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let config = self.config.as_ref().ok_or(SearchError::Disabled)?;

        let url = format!(
            "{}/1/indexes/{}/query",
            config.base_url.trim_end_matches('/'),
            config.index
        );
        let payload = QueryRequest {
            query: query.to_string(),
            hits_per_page: HITS_PER_PAGE,
        };

        let response = self
            .client
            .post(url)
            .header("X-Algolia-Application-Id", &config.app_id)
            .header("X-Algolia-API-Key", &config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::HttpStatus(response.status()));
        }

        let body: QueryResponse = response.json().await?;
        Ok(body.hits)
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    query: String,
    #[serde(rename = "hitsPerPage")]
    hits_per_page: u32,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_client_reports_disabled() {
        let client = HostedSearchClient::new(None);
        let err = client.search("みず").await.unwrap_err();
        assert!(matches!(err, SearchError::Disabled));
    }

    #[test]
    fn hits_tolerate_sparse_documents() {
        let hit: SearchHit =
            serde_json::from_value(serde_json::json!({ "reading": "みず" })).unwrap();
        assert_eq!(hit.reading, "みず");
        assert_eq!(hit.kanji, "");
        assert_eq!(hit.sense, "");
    }
}
