use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::collectors::ResourceKinds;
use crate::error::DiscoveryError;

/// Timestamp embedded in historical keys and the summary.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Count of discovered resources per kind, in kind-list order.
pub type ResourceKindTally = IndexMap<String, usize>;

// Normalized record: PascalCase matches the CSV header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceRecord {
    pub resource_type: String,
    pub resource_id: String,
    pub resource_name: String,
    pub source_account_id: String,
    pub source_region: String,
}

/// One identifier as returned by the catalog, before normalization.
///
/// Aggregated listings carry account and region; local listings do not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResourceEntry {
    pub resource_type: String,
    pub resource_id: String,
    pub resource_name: Option<String>,
    pub source_account_id: Option<String>,
    pub source_region: Option<String>,
}

impl RawResourceEntry {
    pub fn aggregated(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        resource_name: Option<&str>,
        source_account_id: impl Into<String>,
        source_region: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            resource_name: resource_name.map(str::to_string),
            source_account_id: Some(source_account_id.into()),
            source_region: Some(source_region.into()),
        }
    }

    pub fn local(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        resource_name: Option<&str>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            resource_name: resource_name.map(str::to_string),
            ..Self::default()
        }
    }

    /// Fills every absent field so the record never has holes.
    ///
    /// The queried `kind` stands in for a missing type; account and region
    /// fall back to `defaults`.
    pub fn normalize(self, kind: &str, defaults: &RecordDefaults) -> ResourceRecord {
        let resource_type = if self.resource_type.is_empty() {
            kind.to_string()
        } else {
            self.resource_type
        };
        ResourceRecord {
            resource_type,
            resource_id: self.resource_id,
            resource_name: self.resource_name.unwrap_or_default(),
            source_account_id: self
                .source_account_id
                .unwrap_or_else(|| defaults.account_id.clone()),
            source_region: self
                .source_region
                .unwrap_or_else(|| defaults.region.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDefaults {
    pub account_id: String,
    pub region: String,
}

/// Immutable result of one collection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct InventorySnapshot {
    generated_at: DateTime<Utc>,
    records: Vec<ResourceRecord>,
    tally: ResourceKindTally,
}

impl InventorySnapshot {
    pub fn new(
        generated_at: DateTime<Utc>,
        records: Vec<ResourceRecord>,
        tally: ResourceKindTally,
    ) -> Self {
        Self {
            generated_at,
            records,
            tally,
        }
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// `YYYYMMDD_HHMMSS`, shared by every key and metadata value of the run.
    pub fn timestamp(&self) -> String {
        self.generated_at.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn records(&self) -> &[ResourceRecord] {
        &self.records
    }

    pub fn tally(&self) -> &ResourceKindTally {
        &self.tally
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// Catalog interface: one fully paginated listing per resource kind.
// Errors are returned as-is; isolation is the collector's job.
#[async_trait]
pub trait ResourceCatalog: Send + Sync {
    fn name(&self) -> &'static str;
    async fn discover(&self, kind: &str) -> Result<Vec<RawResourceEntry>, DiscoveryError>;
}

#[derive(Debug)]
pub struct KindOutcome {
    pub kind: String,
    /// Number of records contributed, or why the kind was skipped.
    pub result: Result<usize, DiscoveryError>,
}

#[derive(Debug)]
pub struct Collection {
    pub snapshot: InventorySnapshot,
    pub outcomes: Vec<KindOutcome>,
}

impl Collection {
    pub fn failed_kinds(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| o.kind.as_str())
            .collect()
    }
}

/// Drives a [`ResourceCatalog`] over an ordered list of kinds.
pub struct Collector {
    catalog: Arc<dyn ResourceCatalog>,
    kinds: ResourceKinds,
    defaults: RecordDefaults,
}

impl Collector {
    pub fn new(
        catalog: Arc<dyn ResourceCatalog>,
        kinds: ResourceKinds,
        defaults: RecordDefaults,
    ) -> Self {
        Self {
            catalog,
            kinds,
            defaults,
        }
    }

    /// Visits every kind once, in order, and stamps the snapshot when done.
    pub async fn collect(&self) -> Collection {
        let mut records = Vec::new();
        let mut tally = ResourceKindTally::new();
        let mut outcomes = Vec::with_capacity(self.kinds.len());

        for kind in self.kinds.iter() {
            info!(catalog = self.catalog.name(), kind, "processing resource kind");

            // a kind contributes all of its entries or none of them
            let result = match self.catalog.discover(kind).await {
                Ok(entries) => {
                    let count = entries.len();
                    records.extend(entries.into_iter().map(|e| e.normalize(kind, &self.defaults)));
                    tally.insert(kind.to_string(), count);
                    if count > 0 {
                        info!(kind, count, "resources found");
                    }
                    Ok(count)
                }
                Err(err) => {
                    warn!(kind, error = %err, "skipping resource kind");
                    Err(err)
                }
            };
            outcomes.push(KindOutcome {
                kind: kind.to_string(),
                result,
            });
        }

        info!(total = records.len(), "collection finished");
        Collection {
            snapshot: InventorySnapshot::new(Utc::now(), records, tally),
            outcomes,
        }
    }
}
