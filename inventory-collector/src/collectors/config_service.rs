use super::{drain_pages, CatalogMode, Page};
use crate::collector_core::{RawResourceEntry, ResourceCatalog};
use crate::error::DiscoveryError;
use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_config as config;
use config::types::ResourceType;
use tracing::debug;

/// AWS Config discovered-resource listings.
pub struct AwsConfigCatalog {
    client: config::Client,
    mode: CatalogMode,
}

impl AwsConfigCatalog {
    pub fn new(conf: &aws_config::SdkConfig, mode: CatalogMode) -> Self {
        Self {
            client: config::Client::new(conf),
            mode,
        }
    }

    async fn list_aggregate(&self, aggregator: &str, kind: &str) -> Result<Vec<RawResourceEntry>> {
        let client = &self.client;
        let (out, pages) = drain_pages(move |token| async move {
            let resp = client
                .list_aggregate_discovered_resources()
                .configuration_aggregator_name(aggregator)
                .resource_type(ResourceType::from(kind))
                .set_next_token(token)
                .send()
                .await?;

            let entries = resp
                .resource_identifiers()
                .iter()
                .map(|r| {
                    RawResourceEntry::aggregated(
                        r.resource_type().as_str(),
                        r.resource_id(),
                        r.resource_name(),
                        r.source_account_id(),
                        r.source_region(),
                    )
                })
                .collect();
            Ok::<_, anyhow::Error>(Page {
                entries,
                next_token: resp.next_token().map(str::to_string),
            })
        })
        .await?;

        debug!(kind, pages, entries = out.len(), "aggregate listing complete");
        Ok(out)
    }

    async fn list_local(&self, kind: &str) -> Result<Vec<RawResourceEntry>> {
        let client = &self.client;
        let (out, pages) = drain_pages(move |token| async move {
            let resp = client
                .list_discovered_resources()
                .resource_type(ResourceType::from(kind))
                .set_next_token(token)
                .send()
                .await?;

            // local identifiers carry no account or region
            let entries = resp
                .resource_identifiers()
                .iter()
                .map(|r| {
                    RawResourceEntry::local(
                        r.resource_type().map(|t| t.as_str()).unwrap_or_default(),
                        r.resource_id().unwrap_or_default(),
                        r.resource_name(),
                    )
                })
                .collect();
            Ok::<_, anyhow::Error>(Page {
                entries,
                next_token: resp.next_token().map(str::to_string),
            })
        })
        .await?;

        debug!(kind, pages, entries = out.len(), "local listing complete");
        Ok(out)
    }
}

#[async_trait]
impl ResourceCatalog for AwsConfigCatalog {
    fn name(&self) -> &'static str {
        match self.mode {
            CatalogMode::Aggregated { .. } => "aws-config-aggregator",
            CatalogMode::SingleAccount { .. } => "aws-config",
        }
    }

    async fn discover(&self, kind: &str) -> Result<Vec<RawResourceEntry>, DiscoveryError> {
        let listed = match &self.mode {
            CatalogMode::Aggregated { aggregator_name } => {
                self.list_aggregate(aggregator_name, kind).await
            }
            CatalogMode::SingleAccount { .. } => self.list_local(kind).await,
        };
        listed.map_err(|e| DiscoveryError::new(kind, e))
    }
}
