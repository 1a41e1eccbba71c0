//! In-memory catalog used for local runs (`MOCK_MODE`) and tests.

use crate::collector_core::{RawResourceEntry, ResourceCatalog};
use crate::collectors::{drain_pages, Page};
use crate::error::DiscoveryError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves canned pages per resource kind, paged the same way the AWS Config
/// catalog is. Unknown kinds list as one empty page.
#[derive(Default)]
pub struct StaticCatalog {
    pages: HashMap<String, Vec<Vec<RawResourceEntry>>>,
    /// Kind -> (pages served before failing, message).
    failures: HashMap<String, (usize, String)>,
    calls: Mutex<Vec<String>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All of `entries` as a single page.
    pub fn with_entries(self, kind: &str, entries: Vec<RawResourceEntry>) -> Self {
        self.with_pages(kind, vec![entries])
    }

    pub fn with_pages(mut self, kind: &str, pages: Vec<Vec<RawResourceEntry>>) -> Self {
        self.pages.insert(kind.to_string(), pages);
        self
    }

    /// Listing `kind` fails on its first page.
    pub fn failing(self, kind: &str, message: &str) -> Self {
        self.failing_after(kind, 0, message)
    }

    /// Listing `kind` serves `pages` pages, then fails on the next request.
    pub fn failing_after(mut self, kind: &str, pages: usize, message: &str) -> Self {
        self.failures
            .insert(kind.to_string(), (pages, message.to_string()));
        self
    }

    /// Kinds requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// A small multi-account sample for dry runs.
    pub fn demo() -> Self {
        Self::new()
            .with_pages(
                "AWS::EC2::Instance",
                vec![
                    vec![RawResourceEntry::aggregated(
                        "AWS::EC2::Instance",
                        "i-0123456789abcdef0",
                        Some("web-1"),
                        "012345678901",
                        "ap-northeast-2",
                    )],
                    vec![RawResourceEntry::aggregated(
                        "AWS::EC2::Instance",
                        "i-0fedcba9876543210",
                        None,
                        "012345678901",
                        "us-east-1",
                    )],
                ],
            )
            .with_entries(
                "AWS::S3::Bucket",
                vec![RawResourceEntry::aggregated(
                    "AWS::S3::Bucket",
                    "demo-bucket",
                    Some("demo-bucket"),
                    "000111222333",
                    "ap-northeast-2",
                )],
            )
            .with_entries(
                "AWS::RDS::DBInstance",
                vec![RawResourceEntry::aggregated(
                    "AWS::RDS::DBInstance",
                    "db-ABCDEFGHIJKL",
                    Some("demo-db"),
                    "000111222333",
                    "ap-northeast-2",
                )],
            )
    }
}

#[async_trait]
impl ResourceCatalog for StaticCatalog {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn discover(&self, kind: &str) -> Result<Vec<RawResourceEntry>, DiscoveryError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(kind.to_string());
        }
        let pages = self.pages.get(kind).map(Vec::as_slice).unwrap_or_default();
        let failure = self.failures.get(kind);
        let available = match failure {
            Some((after, _)) => pages.len().max(after + 1),
            None => pages.len(),
        };

        let (entries, _) = drain_pages(move |token| {
            let index = token.and_then(|t| t.parse::<usize>().ok()).unwrap_or(0);
            let page = match failure {
                Some((after, message)) if index >= *after => Err(anyhow::anyhow!(message.clone())),
                _ => Ok(Page {
                    entries: pages.get(index).cloned().unwrap_or_default(),
                    next_token: (index + 1 < available).then(|| (index + 1).to_string()),
                }),
            };
            async move { page }
        })
        .await
        .map_err(|e| DiscoveryError::new(kind, e))?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(id: &str) -> RawResourceEntry {
        RawResourceEntry::aggregated("AWS::S3::Bucket", id, Some(id), "000000000042", "us-east-1")
    }

    #[tokio::test]
    async fn pages_are_concatenated_in_order() {
        let catalog = StaticCatalog::new().with_pages(
            "AWS::S3::Bucket",
            vec![vec![bucket("a"), bucket("b")], vec![], vec![bucket("c")]],
        );
        let ids: Vec<_> = catalog
            .discover("AWS::S3::Bucket")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.resource_id)
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn failure_after_good_pages_returns_no_entries() {
        let catalog = StaticCatalog::new()
            .with_pages("AWS::S3::Bucket", vec![vec![bucket("a")], vec![bucket("b")]])
            .failing_after("AWS::S3::Bucket", 2, "ThrottlingException");

        let err = catalog.discover("AWS::S3::Bucket").await.unwrap_err();
        assert_eq!(err.kind, "AWS::S3::Bucket");
        assert!(err.to_string().contains("ThrottlingException"));
    }

    #[tokio::test]
    async fn unknown_kind_lists_empty() {
        let catalog = StaticCatalog::new();
        assert!(catalog.discover("AWS::EKS::Cluster").await.unwrap().is_empty());
        assert_eq!(catalog.calls(), ["AWS::EKS::Cluster"]);
    }
}
