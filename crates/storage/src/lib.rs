//! Document persistence for the learning app.
//!
//! All state lives in keyed document collections. [`document::DocumentStore`]
//! is the backend seam, with a hosted adapter in [`firestore`] and an
//! in-memory one for tests; [`stores::Stores`] bundles the typed views the
//! services work with.

#![forbid(unsafe_code)]

pub mod document;
pub mod firestore;
mod mapping;
pub mod stores;

pub use document::{Document, DocumentStore, FieldValue, Fields, InMemoryStore, StorageError};
pub use firestore::{FirestoreConfig, FirestoreStore};
pub use stores::{LessonStore, StatsStore, Stores};
