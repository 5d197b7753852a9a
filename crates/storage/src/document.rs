use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Field map of one stored document, keyed by field name.
pub type Fields = BTreeMap<String, FieldValue>;

/// A typed field value.
///
/// This is the full set of value types the hosted document backend
/// distinguishes, so adapters can round-trip documents without guessing
/// at types from their textual form.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<FieldValue>),
    Map(Fields),
}

impl FieldValue {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int(value) => u64::try_from(*value).ok(),
            _ => None,
        }
    }

    /// Numeric value as a double. Integers widen, since numbers written by
    /// other clients may come back as either type.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            Self::Array(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            Self::Map(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// A document returned from a collection scan.
#[derive(Debug, Clone)]
pub struct Document {
    pub key: String,
    pub fields: Fields,
}

/// Contract for a keyed document backend.
///
/// Collections are flat maps from a string key to a field map. The typed
/// stores in this crate sit on top of this trait, so swapping the hosted
/// backend for the in-memory one is a constructor choice.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document, `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached or the
    /// document cannot be decoded.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Fields>, StorageError>;

    /// Create the document or merge `fields` into it.
    ///
    /// Merging is per top-level field: a field named in `fields` replaces
    /// the stored one, fields absent from `fields` keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn set(&self, collection: &str, key: &str, fields: Fields) -> Result<(), StorageError>;

    /// Merge `fields` into an existing document.
    ///
    /// Partial writes must never create a document, so a missing document is
    /// `StorageError::NotFound` rather than an insert.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the document does not exist, or
    /// other storage errors.
    async fn update(
        &self,
        collection: &str,
        key: &str,
        fields: Fields,
    ) -> Result<(), StorageError>;

    /// All documents in a collection, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the scan fails.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StorageError>;
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<Mutex<HashMap<String, BTreeMap<String, Fields>>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Fields>, StorageError> {
        let guard = self
            .collections
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .get(collection)
            .and_then(|documents| documents.get(key))
            .cloned())
    }

    async fn set(&self, collection: &str, key: &str, fields: Fields) -> Result<(), StorageError> {
        let mut guard = self
            .collections
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .entry(collection.to_owned())
            .or_default()
            .entry(key.to_owned())
            .or_default()
            .extend(fields);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        fields: Fields,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .collections
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let document = guard
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(key))
            .ok_or(StorageError::NotFound)?;
        document.extend(fields);
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StorageError> {
        let guard = self
            .collections
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .map(|(key, fields)| Document {
                        key: key.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
