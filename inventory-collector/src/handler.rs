//! One inventory invocation: collect, encode, publish, and report.
//!
//! Outcomes map to the response status: `200` when artifacts were
//! published, `404` when nothing was discovered, `500` for invalid
//! configuration. A failed current-artifact write is not a response at all;
//! it comes back as an [`InventoryError`].

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::collector_core::{Collector, InventorySnapshot, ResourceCatalog, ResourceKindTally};
use crate::collectors::CatalogMode;
use crate::config::InventoryConfig;
use crate::error::{ConfigError, InventoryError};
use crate::out::encode;
use crate::out::publish::{ArtifactLayout, HistoricalFailure, PublicationReport, Publisher};
use crate::store::ObjectStore;

pub const STATUS_OK: u16 = 200;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_CONFIG_INVALID: u16 = 500;

#[derive(Debug, Clone, Serialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Completed(CompletedBody),
    NotFound(NotFoundBody),
    ConfigInvalid(ConfigInvalidBody),
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletedBody {
    pub message: String,
    pub timestamp: String,
    pub total_resources: usize,
    /// Artifact URIs keyed by `current_csv`, `historical_csv_compressed`, ...
    #[serde(flatten)]
    pub artifacts: BTreeMap<String, String>,
    pub compression_info: CompressionInfo,
    pub resources_by_type: ResourceKindTally,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_resource_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_historical: Vec<HistoricalFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompressionInfo {
    pub historical_files_compressed: bool,
    pub compression_type: &'static str,
    pub layout: ArtifactLayout,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotFoundBody {
    pub message: String,
    pub total_resources: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_resource_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigInvalidBody {
    pub error: String,
    pub missing_variables: Vec<&'static str>,
}

impl InvocationResponse {
    pub fn config_invalid(err: &ConfigError) -> Self {
        Self {
            status_code: STATUS_CONFIG_INVALID,
            body: ResponseBody::ConfigInvalid(ConfigInvalidBody {
                error: err.to_string(),
                missing_variables: err.missing_variables().to_vec(),
            }),
        }
    }

    pub fn not_found(failed_resource_types: Vec<String>) -> Self {
        Self {
            status_code: STATUS_NOT_FOUND,
            body: ResponseBody::NotFound(NotFoundBody {
                message: "No resources found".to_string(),
                total_resources: 0,
                failed_resource_types,
            }),
        }
    }

    pub fn completed(
        snapshot: &InventorySnapshot,
        report: &PublicationReport,
        failed_resource_types: Vec<String>,
        layout: ArtifactLayout,
    ) -> Self {
        let artifacts = report
            .published
            .iter()
            .map(|a| (a.response_field().to_string(), a.uri.clone()))
            .collect();

        Self {
            status_code: STATUS_OK,
            body: ResponseBody::Completed(CompletedBody {
                message: "Inventory completed successfully".to_string(),
                timestamp: snapshot.timestamp(),
                total_resources: snapshot.total(),
                artifacts,
                compression_info: CompressionInfo {
                    historical_files_compressed: true,
                    compression_type: "gzip",
                    layout,
                },
                resources_by_type: snapshot.tally().clone(),
                failed_resource_types,
                failed_historical: report.failed_historical.clone(),
            }),
        }
    }
}

/// Runs collection and publication for an already validated config.
///
/// Per-kind discovery failures and historical upload failures are absorbed
/// into the response; encoding and current-artifact failures are returned.
pub async fn run_inventory(
    config: &InventoryConfig,
    catalog: Arc<dyn ResourceCatalog>,
    mode: &CatalogMode,
    store: &dyn ObjectStore,
) -> Result<InvocationResponse, InventoryError> {
    info!(
        region = %config.region,
        aggregator = %config.aggregator_name,
        bucket = %config.bucket,
        use_aggregator = config.use_aggregator,
        kinds = config.resource_kinds.len(),
        "starting resource inventory"
    );

    let collector = Collector::new(catalog, config.resource_kinds.clone(), mode.record_defaults());
    let collection = collector.collect().await;
    let failed: Vec<String> = collection
        .failed_kinds()
        .into_iter()
        .map(str::to_string)
        .collect();
    if !failed.is_empty() {
        warn!(count = failed.len(), kinds = ?failed, "some resource kinds could not be listed");
    }

    let snapshot = collection.snapshot;
    if snapshot.is_empty() {
        info!("no resources found, nothing published");
        return Ok(InvocationResponse::not_found(failed));
    }

    let publisher = Publisher::new(store, config.output_names(), config.layout);
    let links = publisher.links(&snapshot.timestamp());
    let encoded = encode(&snapshot, config.environment.as_deref(), links)
        .inspect_err(|e| error!(error = %e, "failed to encode inventory"))?;

    let report = publisher
        .publish(&snapshot, &encoded)
        .await
        .inspect_err(|e| error!(key = %e.key, error = %e.source, "publication aborted"))?;

    info!(total = snapshot.total(), timestamp = %snapshot.timestamp(), "inventory completed");
    Ok(InvocationResponse::completed(&snapshot, &report, failed, config.layout))
}
