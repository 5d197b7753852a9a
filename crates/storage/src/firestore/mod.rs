use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use crate::document::{Document, DocumentStore, Fields, StorageError};
use crate::stores::Stores;

mod value;

use value::{ApiValue, decode_fields, encode_fields};

/// Connection settings for the hosted document database.
#[derive(Clone, Debug)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub api_key: Option<String>,
    pub base_url: String,
}

impl FirestoreConfig {
    /// Read settings from `NIHONGO_FIRESTORE_*` variables.
    ///
    /// Returns `None` when no project id is configured, which callers treat
    /// as "run against the in-memory store".
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let project_id = env::var("NIHONGO_FIRESTORE_PROJECT").ok()?;
        if project_id.trim().is_empty() {
            return None;
        }
        let api_key = env::var("NIHONGO_FIRESTORE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let base_url = env::var("NIHONGO_FIRESTORE_URL")
            .unwrap_or_else(|_| "https://firestore.googleapis.com/v1".into());
        Some(Self {
            project_id,
            api_key,
            base_url,
        })
    }
}

/// [`DocumentStore`] backed by the document database's REST API.
///
/// Writes go through `PATCH` with an update mask naming exactly the fields
/// being written, which gives the per-field merge the trait asks for. The
/// update-only verb adds an existence precondition on top, so a partial
/// write can never create a document.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Client,
    config: FirestoreConfig,
}

impl FirestoreStore {
    #[must_use]
    pub fn new(config: FirestoreConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.project_id,
            collection
        )
    }

    fn document_url(&self, collection: &str, key: &str) -> String {
        format!("{}/{}", self.collection_url(collection), key)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }

    /// Field names used by this crate are plain identifiers, so they can go
    /// into the update mask without field-path quoting.
    fn patch_request(&self, collection: &str, key: &str, fields: &Fields) -> RequestBuilder {
        let mut request = self.client.patch(self.document_url(collection, key));
        for name in fields.keys() {
            request = request.query(&[("updateMask.fieldPaths", name.as_str())]);
        }
        self.authorize(request).json(&WriteRequest {
            fields: encode_fields(fields),
        })
    }
}

#[async_trait::async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Fields>, StorageError> {
        let request = self.authorize(self.client.get(self.document_url(collection, key)));
        let response = request
            .send()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StorageError::Connection(format!(
                "http status {}",
                response.status()
            )));
        }

        let document: ApiDocument = response
            .json()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(decode_fields(document.fields)?))
    }

    async fn set(&self, collection: &str, key: &str, fields: Fields) -> Result<(), StorageError> {
        let response = self
            .patch_request(collection, key, &fields)
            .send()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::Connection(format!(
                "http status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        fields: Fields,
    ) -> Result<(), StorageError> {
        let response = self
            .patch_request(collection, key, &fields)
            .query(&[("currentDocument.exists", "true")])
            .send()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound);
        }
        if !response.status().is_success() {
            return Err(StorageError::Connection(format!(
                "http status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StorageError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.collection_url(collection))
                .query(&[("pageSize", "300")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = self
                .authorize(request)
                .send()
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            if !response.status().is_success() {
                return Err(StorageError::Connection(format!(
                    "http status {}",
                    response.status()
                )));
            }

            let page: ListResponse = response
                .json()
                .await
                .map_err(|e| StorageError::Serialization(e.to_string()))?;

            for document in page.documents {
                let key = document
                    .name
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .to_owned();
                documents.push(Document {
                    key,
                    fields: decode_fields(document.fields)?,
                });
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }
}

impl Stores {
    /// Build [`Stores`] backed by the hosted document database.
    #[must_use]
    pub fn firestore(config: FirestoreConfig) -> Self {
        Self::new(Arc::new(FirestoreStore::new(config)))
    }
}

#[derive(Debug, Serialize)]
struct WriteRequest {
    fields: BTreeMap<String, ApiValue>,
}

#[derive(Debug, Deserialize)]
struct ApiDocument {
    #[serde(default)]
    name: String,
    #[serde(default)]
    fields: BTreeMap<String, ApiValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<ApiDocument>,
    next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> FirestoreConfig {
        FirestoreConfig {
            project_id: "nihongo-app".into(),
            api_key: None,
            base_url: "https://firestore.example/v1/".into(),
        }
    }

    #[test]
    fn store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FirestoreStore>();
    }

    #[test]
    fn document_urls_address_the_default_database() {
        let store = FirestoreStore::new(sample_config());
        assert_eq!(
            store.document_url("lessons", "l1"),
            "https://firestore.example/v1/projects/nihongo-app/databases/(default)/documents/lessons/l1"
        );
    }
}
