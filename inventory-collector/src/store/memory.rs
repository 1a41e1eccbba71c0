use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{ObjectStore, ObjectSummary, PublishedArtifact, StoredObject};
use crate::error::StoreError;

/// In-memory object store.
///
/// Writes to keys under any prefix registered with [`MemoryStore::failing_prefix`]
/// are rejected, which lets tests simulate an unreachable bucket path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, Entry>>,
    failing_prefixes: Vec<String>,
}

#[derive(Debug, Clone)]
struct Entry {
    artifact: PublishedArtifact,
    last_modified: DateTime<Utc>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.failing_prefixes.push(prefix.into());
        self
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .read()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn artifact(&self, key: &str) -> Option<PublishedArtifact> {
        self.objects
            .read()
            .ok()
            .and_then(|o| o.get(key).map(|e| e.artifact.clone()))
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, artifact: &PublishedArtifact) -> Result<(), StoreError> {
        if self
            .failing_prefixes
            .iter()
            .any(|p| artifact.key.starts_with(p.as_str()))
        {
            return Err(StoreError::message(&artifact.key, "bucket unreachable"));
        }
        let mut objects = self
            .objects
            .write()
            .map_err(|_| StoreError::message(&artifact.key, "lock poisoned"))?;
        objects.insert(
            artifact.key.clone(),
            Entry {
                artifact: artifact.clone(),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        let objects = self
            .objects
            .read()
            .map_err(|_| StoreError::message(key, "lock poisoned"))?;
        objects
            .get(key)
            .map(|e| StoredObject {
                body: e.artifact.body.clone(),
                content_type: Some(e.artifact.content_type.to_string()),
                metadata: e.artifact.metadata.clone(),
            })
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, StoreError> {
        let objects = self
            .objects
            .read()
            .map_err(|_| StoreError::message(prefix, "lock poisoned"))?;
        Ok(objects
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, e)| ObjectSummary {
                key: k.clone(),
                size: e.artifact.body.len() as u64,
                last_modified: Some(e.last_modified),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_returns_body_and_metadata() {
        let store = MemoryStore::new("inventory");
        let artifact = PublishedArtifact::new("a/current/x.csv", "hello", "text/csv")
            .with_meta("RecordCount", "1");
        store.put(&artifact).await.expect("put should succeed");

        let got = store.get("a/current/x.csv").await.expect("get should succeed");
        assert_eq!(got.body, "hello");
        assert_eq!(got.content_type.as_deref(), Some("text/csv"));
        assert_eq!(got.metadata.get("RecordCount").map(String::as_str), Some("1"));
        assert_eq!(store.uri("a/current/x.csv"), "s3://inventory/a/current/x.csv");
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let store = MemoryStore::new("inventory");
        let err = store.get("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(k) if k == "nope"));
    }

    #[tokio::test]
    async fn failing_prefix_rejects_writes() {
        let store = MemoryStore::new("inventory").failing_prefix("a/historical/");
        let ok = PublishedArtifact::new("a/current/x.csv", "x", "text/csv");
        let bad = PublishedArtifact::new("a/historical/x.csv.gz", "x", "application/gzip");

        assert!(store.put(&ok).await.is_ok());
        assert!(store.put(&bad).await.is_err());
        assert_eq!(store.keys(), ["a/current/x.csv"]);
    }

    #[tokio::test]
    async fn list_filters_by_prefix() {
        let store = MemoryStore::new("inventory");
        for key in ["p/historical/a.gz", "p/historical/b.gz", "p/current/c.csv"] {
            store
                .put(&PublishedArtifact::new(key, "abc", "application/gzip"))
                .await
                .unwrap();
        }
        let listed = store.list("p/historical/").await.unwrap();
        let keys: Vec<_> = listed.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, ["p/historical/a.gz", "p/historical/b.gz"]);
        assert_eq!(listed[0].size, 3);
    }
}
