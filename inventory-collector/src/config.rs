//! Process configuration, read from environment variables.

use crate::collectors::{CatalogMode, ResourceKinds};
use crate::error::ConfigError;
use crate::out::publish::{ArtifactLayout, OutputNames};
use crate::utils::{flag_or, non_empty};

/// Variables that must be present and non-empty, in reporting order.
pub const REQUIRED_VARS: [&str; 8] = [
    "REGION",
    "AGGREGATOR_NAME",
    "S3_BUCKET",
    "CSV_FILENAME",
    "EXCEL_FILENAME",
    "SUMMARY_FILENAME",
    "S3_KEY_PREFIX",
    "ACCOUNT_ID",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    pub region: String,
    pub aggregator_name: String,
    pub bucket: String,
    pub csv_filename: String,
    pub excel_filename: String,
    pub summary_filename: String,
    pub key_prefix: String,
    pub account_id: String,
    /// `USE_AGGREGATOR`, on unless set to something other than `true`.
    pub use_aggregator: bool,
    pub environment: Option<String>,
    /// `ARTIFACT_LAYOUT`, `separate` unless overridden.
    pub layout: ArtifactLayout,
    /// `RESOURCE_TYPES`, the standard catalog unless overridden.
    pub resource_kinds: ResourceKinds,
}

impl InventoryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    ///
    /// Every missing required variable is reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut required = |key: &'static str| {
            non_empty(&lookup, key).unwrap_or_else(|| {
                missing.push(key);
                String::new()
            })
        };

        let region = required("REGION");
        let aggregator_name = required("AGGREGATOR_NAME");
        let bucket = required("S3_BUCKET");
        let csv_filename = required("CSV_FILENAME");
        let excel_filename = required("EXCEL_FILENAME");
        let summary_filename = required("SUMMARY_FILENAME");
        let key_prefix = required("S3_KEY_PREFIX");
        let account_id = required("ACCOUNT_ID");

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let layout = match non_empty(&lookup, "ARTIFACT_LAYOUT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "ARTIFACT_LAYOUT",
                value: raw,
            })?,
            None => ArtifactLayout::default(),
        };

        let resource_kinds = match non_empty(&lookup, "RESOURCE_TYPES") {
            Some(raw) => {
                let kinds = ResourceKinds::parse_list(&raw);
                if kinds.is_empty() {
                    return Err(ConfigError::Invalid {
                        name: "RESOURCE_TYPES",
                        value: raw,
                    });
                }
                kinds
            }
            None => ResourceKinds::default(),
        };

        Ok(Self {
            region,
            aggregator_name,
            bucket,
            csv_filename,
            excel_filename,
            summary_filename,
            key_prefix,
            account_id,
            use_aggregator: flag_or(&lookup, "USE_AGGREGATOR", true),
            environment: non_empty(&lookup, "ENVIRONMENT"),
            layout,
            resource_kinds,
        })
    }

    pub fn output_names(&self) -> OutputNames {
        OutputNames {
            prefix: self.key_prefix.clone(),
            csv_filename: self.csv_filename.clone(),
            excel_filename: self.excel_filename.clone(),
            summary_filename: self.summary_filename.clone(),
        }
    }

    /// Catalog mode for this run. `execution_account` is only used when the
    /// aggregator is disabled.
    pub fn catalog_mode(&self, execution_account: impl Into<String>) -> CatalogMode {
        if self.use_aggregator {
            CatalogMode::Aggregated {
                aggregator_name: self.aggregator_name.clone(),
            }
        } else {
            CatalogMode::SingleAccount {
                account_id: execution_account.into(),
                region: self.region.clone(),
            }
        }
    }
}
