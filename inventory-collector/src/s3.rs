use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::primitives::ByteStream;
use std::collections::{BTreeMap, HashMap};

use crate::error::StoreError;
use crate::store::{ObjectStore, ObjectSummary, PublishedArtifact, StoredObject};

/// S3-backed [`ObjectStore`] bound to one bucket.
pub struct S3Store {
    client: s3::Client,
    bucket: String,
}

impl S3Store {
    pub fn new(cfg: &aws_config::SdkConfig, bucket: impl Into<String>) -> Self {
        Self {
            client: s3::Client::new(cfg),
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, artifact: &PublishedArtifact) -> Result<(), StoreError> {
        let metadata: HashMap<String, String> = artifact.metadata.clone().into_iter().collect();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&artifact.key)
            .body(ByteStream::from(artifact.body.clone()))
            .content_type(artifact.content_type)
            .set_content_encoding(artifact.content_encoding.map(str::to_string))
            .set_metadata(Some(metadata))
            .send()
            .await
            .map_err(|e| StoreError::backend(&artifact.key, e))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        let resp = match self.client.get_object().bucket(&self.bucket).key(key).send().await {
            Ok(r) => r,
            Err(e) => {
                let missing = e.as_service_error().is_some_and(|se| se.is_no_such_key());
                return Err(if missing {
                    StoreError::NotFound(key.to_string())
                } else {
                    StoreError::backend(key, e)
                });
            }
        };

        let content_type = resp.content_type().map(str::to_string);
        let metadata: BTreeMap<String, String> = resp
            .metadata()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| StoreError::backend(key, e))?
            .into_bytes();

        Ok(StoredObject {
            body,
            content_type,
            metadata,
        })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, StoreError> {
        let mut out = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(token.take())
                .send()
                .await
                .map_err(|e| StoreError::backend(prefix, e))?;

            for obj in resp.contents() {
                let Some(key) = obj.key() else { continue };
                out.push(ObjectSummary {
                    key: key.to_string(),
                    size: obj.size().and_then(|s| u64::try_from(s).ok()).unwrap_or(0),
                    last_modified: obj
                        .last_modified()
                        .and_then(|t| chrono::DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
                });
            }

            token = resp.next_continuation_token().map(str::to_string);
            if token.is_none() {
                break;
            }
        }

        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }
}
