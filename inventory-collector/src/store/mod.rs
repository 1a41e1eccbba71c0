//! Object store abstraction for published artifacts.
//!
//! The pipeline only needs named byte blobs with a content type and a flat
//! string metadata map. [`crate::s3::S3Store`] talks to S3; [`MemoryStore`]
//! keeps everything in process for tests and dry runs.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::error::StoreError;

/// One object to write: key, body, content type and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedArtifact {
    pub key: String,
    pub body: Bytes,
    pub content_type: &'static str,
    pub content_encoding: Option<&'static str>,
    pub metadata: BTreeMap<String, String>,
}

impl PublishedArtifact {
    pub fn new(key: impl Into<String>, body: impl Into<Bytes>, content_type: &'static str) -> Self {
        Self {
            key: key.into(),
            body: body.into(),
            content_type,
            content_encoding: None,
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: &'static str) -> Self {
        self.content_encoding = Some(encoding);
        self
    }

    #[must_use]
    pub fn with_meta(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn bucket(&self) -> &str;

    /// Writes unconditionally; an existing object at the key is replaced.
    async fn put(&self, artifact: &PublishedArtifact) -> Result<(), StoreError>;

    /// Returns `StoreError::NotFound` if the key does not exist.
    async fn get(&self, key: &str) -> Result<StoredObject, StoreError>;

    /// All objects under `prefix`, sorted by key.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, StoreError>;

    fn uri(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket(), key)
    }
}
