//! Writes current and historical artifacts for one snapshot.
//!
//! Current artifacts live at fixed keys and are overwritten every run; a
//! failure there aborts publication. Historical artifacts are gzip-compressed
//! under timestamped keys and are best-effort: failures are logged and
//! reported but never abort the run.

use serde::Serialize;
use std::str::FromStr;
use tracing::{error, info, warn};

use super::{gzip, EncodedInventory, SummaryLinks, EXCEL_ACCOUNT_STYLE, PRIMARY_ACCOUNT_STYLE};
use crate::collector_core::InventorySnapshot;
use crate::error::PublishError;
use crate::store::{ObjectStore, PublishedArtifact};

pub const CONTENT_TYPE_CSV: &str = "text/csv";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_GZIP: &str = "application/gzip";

/// File name stem of the consolidated historical report.
pub const CONSOLIDATED_STEM: &str = "inventory-complete";

/// Which historical artifacts a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactLayout {
    #[default]
    Separate,
    Consolidated,
}

impl FromStr for ArtifactLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "separate" => Ok(ArtifactLayout::Separate),
            "consolidated" => Ok(ArtifactLayout::Consolidated),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFamily {
    Csv,
    ExcelCsv,
    Summary,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Current,
    Historical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNames {
    pub prefix: String,
    pub csv_filename: String,
    pub excel_filename: String,
    pub summary_filename: String,
}

impl OutputNames {
    fn root(&self) -> &str {
        self.prefix.trim_end_matches('/')
    }

    pub fn current_key(&self, filename: &str) -> String {
        format!("{}/current/{filename}", self.root())
    }

    /// `{prefix}/historical/{stem}_{timestamp}{ext}.gz`, where `stem` is
    /// `filename` without `ext`.
    pub fn historical_key(&self, filename: &str, ext: &str, timestamp: &str) -> String {
        let stem = filename.strip_suffix(ext).unwrap_or(filename);
        format!("{}/historical/{stem}_{timestamp}{ext}.gz", self.root())
    }

    pub fn consolidated_key(&self, timestamp: &str) -> String {
        format!(
            "{}/historical/{CONSOLIDATED_STEM}_{timestamp}.txt.gz",
            self.root()
        )
    }

    pub fn run_keys(&self, timestamp: &str) -> RunKeys {
        RunKeys {
            current_csv: self.current_key(&self.csv_filename),
            current_excel: self.current_key(&self.excel_filename),
            current_summary: self.current_key(&self.summary_filename),
            historical_csv: self.historical_key(&self.csv_filename, ".csv", timestamp),
            historical_excel: self.historical_key(&self.excel_filename, ".csv", timestamp),
            historical_summary: self.historical_key(&self.summary_filename, ".json", timestamp),
            consolidated: self.consolidated_key(timestamp),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunKeys {
    pub current_csv: String,
    pub current_excel: String,
    pub current_summary: String,
    pub historical_csv: String,
    pub historical_excel: String,
    pub historical_summary: String,
    pub consolidated: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactLocation {
    pub family: ArtifactFamily,
    pub lifecycle: Lifecycle,
    pub key: String,
    pub uri: String,
}

impl ArtifactLocation {
    /// Field name used for this artifact in the invocation response.
    pub fn response_field(&self) -> &'static str {
        match (self.lifecycle, self.family) {
            (Lifecycle::Current, ArtifactFamily::Csv) => "current_csv",
            (Lifecycle::Current, ArtifactFamily::ExcelCsv) => "current_excel_csv",
            (Lifecycle::Current, ArtifactFamily::Summary) => "current_summary",
            (Lifecycle::Current, ArtifactFamily::Report) => "current_report",
            (Lifecycle::Historical, ArtifactFamily::Csv) => "historical_csv_compressed",
            (Lifecycle::Historical, ArtifactFamily::ExcelCsv) => "historical_excel_csv_compressed",
            (Lifecycle::Historical, ArtifactFamily::Summary) => "historical_summary_compressed",
            (Lifecycle::Historical, ArtifactFamily::Report) => "historical_report_compressed",
        }
    }
}

/// A historical write that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoricalFailure {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicationReport {
    pub published: Vec<ArtifactLocation>,
    pub failed_historical: Vec<HistoricalFailure>,
}

impl PublicationReport {
    pub fn uri(&self, family: ArtifactFamily, lifecycle: Lifecycle) -> Option<&str> {
        self.published
            .iter()
            .find(|a| a.family == family && a.lifecycle == lifecycle)
            .map(|a| a.uri.as_str())
    }
}

pub struct Publisher<'a> {
    store: &'a dyn ObjectStore,
    names: OutputNames,
    layout: ArtifactLayout,
}

impl<'a> Publisher<'a> {
    pub fn new(store: &'a dyn ObjectStore, names: OutputNames, layout: ArtifactLayout) -> Self {
        Self {
            store,
            names,
            layout,
        }
    }

    /// URIs this publisher will write for a run stamped `timestamp`.
    pub fn links(&self, timestamp: &str) -> SummaryLinks {
        let keys = self.names.run_keys(timestamp);
        let uri = |key: &str| self.store.uri(key);
        let separate = self.layout == ArtifactLayout::Separate;

        SummaryLinks {
            current_csv: uri(&keys.current_csv),
            current_excel_csv: uri(&keys.current_excel),
            historical_csv: separate.then(|| uri(&keys.historical_csv)),
            historical_excel_csv: separate.then(|| uri(&keys.historical_excel)),
            historical_report: (!separate).then(|| uri(&keys.consolidated)),
        }
    }

    pub async fn publish(
        &self,
        snapshot: &InventorySnapshot,
        encoded: &EncodedInventory,
    ) -> Result<PublicationReport, PublishError> {
        let ts = snapshot.timestamp();
        let count = snapshot.total().to_string();
        let separate = self.layout == ArtifactLayout::Separate;
        let keys = self.names.run_keys(&ts);
        let mut report = PublicationReport::default();

        let csv = PublishedArtifact::new(
            keys.current_csv,
            encoded.csv.clone(),
            CONTENT_TYPE_CSV,
        )
        .with_meta("LastUpdated", &ts)
        .with_meta("RecordCount", &count)
        .with_meta("account-id-format", PRIMARY_ACCOUNT_STYLE.label());
        self.put_current(&mut report, ArtifactFamily::Csv, csv).await?;
        if separate {
            self.put_historical(&mut report, ArtifactFamily::Csv, keys.historical_csv, &encoded.csv, &[])
                .await;
        }

        let excel = PublishedArtifact::new(
            keys.current_excel,
            encoded.excel_csv.clone(),
            CONTENT_TYPE_CSV,
        )
        .with_meta("format", "excel-friendly")
        .with_meta("LastUpdated", &ts)
        .with_meta("RecordCount", &count)
        .with_meta("account-id-format", EXCEL_ACCOUNT_STYLE.label());
        self.put_current(&mut report, ArtifactFamily::ExcelCsv, excel).await?;
        if separate {
            self.put_historical(
                &mut report,
                ArtifactFamily::ExcelCsv,
                keys.historical_excel,
                &encoded.excel_csv,
                &[
                    ("format", "excel-friendly"),
                    ("account-id-format", EXCEL_ACCOUNT_STYLE.label()),
                ],
            )
            .await;
        }

        let summary = PublishedArtifact::new(
            keys.current_summary,
            encoded.summary_json.clone(),
            CONTENT_TYPE_JSON,
        )
        .with_meta("LastUpdated", &ts);
        self.put_current(&mut report, ArtifactFamily::Summary, summary).await?;
        if separate {
            self.put_historical(
                &mut report,
                ArtifactFamily::Summary,
                keys.historical_summary,
                &encoded.summary_json,
                &[],
            )
            .await;
        } else {
            self.put_historical(
                &mut report,
                ArtifactFamily::Report,
                keys.consolidated,
                &encoded.consolidated,
                &[("RecordCount", count.as_str())],
            )
            .await;
        }

        info!(
            published = report.published.len(),
            failed_historical = report.failed_historical.len(),
            "publication finished"
        );
        Ok(report)
    }

    async fn put_current(
        &self,
        report: &mut PublicationReport,
        family: ArtifactFamily,
        artifact: PublishedArtifact,
    ) -> Result<(), PublishError> {
        if let Err(source) = self.store.put(&artifact).await {
            error!(key = %artifact.key, error = %source, "current artifact upload failed");
            return Err(PublishError {
                key: artifact.key,
                source,
            });
        }
        let uri = self.store.uri(&artifact.key);
        info!(%uri, "current artifact uploaded");
        report.published.push(ArtifactLocation {
            family,
            lifecycle: Lifecycle::Current,
            key: artifact.key,
            uri,
        });
        Ok(())
    }

    async fn put_historical(
        &self,
        report: &mut PublicationReport,
        family: ArtifactFamily,
        key: String,
        text: &str,
        extra_meta: &[(&str, &str)],
    ) {
        let compressed = match gzip::compress(text) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(%key, error = %e, "historical artifact compression failed");
                report.failed_historical.push(HistoricalFailure {
                    key,
                    reason: e.to_string(),
                });
                return;
            }
        };

        let mut artifact = PublishedArtifact::new(key, compressed, CONTENT_TYPE_GZIP)
            .with_encoding("gzip")
            .with_meta("original-size", text.len().to_string())
            .with_meta("compression", "gzip");
        for (k, v) in extra_meta {
            artifact = artifact.with_meta(k, *v);
        }

        match self.store.put(&artifact).await {
            Ok(()) => {
                let uri = self.store.uri(&artifact.key);
                info!(%uri, original = text.len(), compressed = artifact.body.len(), "historical artifact uploaded");
                report.published.push(ArtifactLocation {
                    family,
                    lifecycle: Lifecycle::Historical,
                    key: artifact.key,
                    uri,
                });
            }
            Err(e) => {
                warn!(key = %artifact.key, error = %e, "historical artifact upload failed");
                report.failed_historical.push(HistoricalFailure {
                    key: artifact.key,
                    reason: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector_core::{ResourceKindTally, ResourceRecord};
    use crate::out::encode;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn names() -> OutputNames {
        OutputNames {
            prefix: "aws-config-inventory/".into(),
            csv_filename: "resources.csv".into(),
            excel_filename: "resources-excel.csv".into(),
            summary_filename: "summary.json".into(),
        }
    }

    fn encoded(store: &MemoryStore, layout: ArtifactLayout, snap: &InventorySnapshot) -> EncodedInventory {
        let links = Publisher::new(store, names(), layout).links(&snap.timestamp());
        encode(snap, None, links).unwrap()
    }

    fn snapshot() -> InventorySnapshot {
        let record = ResourceRecord {
            resource_type: "AWS::Lambda::Function".into(),
            resource_id: "fn-1".into(),
            resource_name: "ingest".into(),
            source_account_id: "000000000777".into(),
            source_region: "us-east-1".into(),
        };
        let mut tally = ResourceKindTally::new();
        tally.insert("AWS::Lambda::Function".into(), 1);
        let at = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 58).unwrap();
        InventorySnapshot::new(at, vec![record], tally)
    }

    #[test]
    fn keys_follow_layout_conventions() {
        let n = names();
        assert_eq!(n.current_key("resources.csv"), "aws-config-inventory/current/resources.csv");
        assert_eq!(
            n.historical_key("resources.csv", ".csv", "20241231_235958"),
            "aws-config-inventory/historical/resources_20241231_235958.csv.gz"
        );
        assert_eq!(
            n.historical_key("inventory", ".csv", "20241231_235958"),
            "aws-config-inventory/historical/inventory_20241231_235958.csv.gz"
        );
        assert_eq!(
            n.consolidated_key("20241231_235958"),
            "aws-config-inventory/historical/inventory-complete_20241231_235958.txt.gz"
        );
    }

    #[test]
    fn layout_parses_case_insensitively() {
        assert_eq!("Consolidated".parse::<ArtifactLayout>(), Ok(ArtifactLayout::Consolidated));
        assert_eq!(" separate ".parse::<ArtifactLayout>(), Ok(ArtifactLayout::Separate));
        assert!("both".parse::<ArtifactLayout>().is_err());
    }

    #[tokio::test]
    async fn separate_layout_writes_six_artifacts_with_metadata() {
        let store = MemoryStore::new("bucket");
        let snap = snapshot();
        let encoded = encoded(&store, ArtifactLayout::Separate, &snap);
        let report = Publisher::new(&store, names(), ArtifactLayout::Separate)
            .publish(&snap, &encoded)
            .await
            .unwrap();

        assert_eq!(report.published.len(), 6);
        assert!(report.failed_historical.is_empty());

        let csv = store.artifact("aws-config-inventory/current/resources.csv").unwrap();
        assert_eq!(csv.content_type, CONTENT_TYPE_CSV);
        assert_eq!(csv.metadata["LastUpdated"], "20241231_235958");
        assert_eq!(csv.metadata["RecordCount"], "1");
        assert_eq!(csv.metadata["account-id-format"], "formula-text");

        let excel = store.artifact("aws-config-inventory/current/resources-excel.csv").unwrap();
        assert_eq!(excel.metadata["format"], "excel-friendly");
        assert_eq!(excel.metadata["account-id-format"], "zero-padded-12");

        let hist = store
            .artifact("aws-config-inventory/historical/resources_20241231_235958.csv.gz")
            .unwrap();
        assert_eq!(hist.content_type, CONTENT_TYPE_GZIP);
        assert_eq!(hist.content_encoding, Some("gzip"));
        assert_eq!(hist.metadata["compression"], "gzip");
        assert_eq!(hist.metadata["original-size"], encoded.csv.len().to_string());
        assert_eq!(gzip::decompress(&hist.body).unwrap(), encoded.csv.as_bytes());

        assert!(store
            .artifact("aws-config-inventory/historical/summary_20241231_235958.json.gz")
            .is_some());
    }

    #[tokio::test]
    async fn summary_links_point_at_published_artifacts() {
        for layout in [ArtifactLayout::Separate, ArtifactLayout::Consolidated] {
            let store = MemoryStore::new("bucket");
            let snap = snapshot();
            let encoded = encoded(&store, layout, &snap);
            let report = Publisher::new(&store, names(), layout)
                .publish(&snap, &encoded)
                .await
                .unwrap();

            let links = &encoded.summary.links;
            let published = |family, lifecycle| report.uri(family, lifecycle).map(str::to_string);
            assert_eq!(Some(links.current_csv.clone()), published(ArtifactFamily::Csv, Lifecycle::Current));
            assert_eq!(
                Some(links.current_excel_csv.clone()),
                published(ArtifactFamily::ExcelCsv, Lifecycle::Current)
            );
            assert_eq!(links.historical_csv, published(ArtifactFamily::Csv, Lifecycle::Historical));
            assert_eq!(
                links.historical_excel_csv,
                published(ArtifactFamily::ExcelCsv, Lifecycle::Historical)
            );
            assert_eq!(links.historical_report, published(ArtifactFamily::Report, Lifecycle::Historical));
        }
    }

    #[tokio::test]
    async fn consolidated_layout_writes_one_historical_report() {
        let store = MemoryStore::new("bucket");
        let snap = snapshot();
        let encoded = encoded(&store, ArtifactLayout::Consolidated, &snap);
        let report = Publisher::new(&store, names(), ArtifactLayout::Consolidated)
            .publish(&snap, &encoded)
            .await
            .unwrap();

        let historical: Vec<_> = report
            .published
            .iter()
            .filter(|a| a.lifecycle == Lifecycle::Historical)
            .collect();
        assert_eq!(historical.len(), 1);
        assert_eq!(historical[0].family, ArtifactFamily::Report);
        assert_eq!(
            report.uri(ArtifactFamily::Report, Lifecycle::Historical),
            Some("s3://bucket/aws-config-inventory/historical/inventory-complete_20241231_235958.txt.gz")
        );

        let body = store
            .artifact("aws-config-inventory/historical/inventory-complete_20241231_235958.txt.gz")
            .unwrap()
            .body;
        assert_eq!(gzip::decompress(&body).unwrap(), encoded.consolidated.as_bytes());
        assert_eq!(store.keys().len(), 4);
    }

    #[tokio::test]
    async fn historical_failures_are_reported_not_raised() {
        let store = MemoryStore::new("bucket").failing_prefix("aws-config-inventory/historical/");
        let snap = snapshot();
        let encoded = encoded(&store, ArtifactLayout::Separate, &snap);
        let report = Publisher::new(&store, names(), ArtifactLayout::Separate)
            .publish(&snap, &encoded)
            .await
            .expect("historical failures must not abort publication");

        assert_eq!(report.published.len(), 3);
        assert_eq!(report.failed_historical.len(), 3);
        assert!(report
            .published
            .iter()
            .all(|a| a.lifecycle == Lifecycle::Current));
    }

    #[tokio::test]
    async fn current_failure_aborts_publication() {
        let store =
            MemoryStore::new("bucket").failing_prefix("aws-config-inventory/current/resources-excel");
        let snap = snapshot();
        let encoded = encoded(&store, ArtifactLayout::Separate, &snap);
        let err = Publisher::new(&store, names(), ArtifactLayout::Separate)
            .publish(&snap, &encoded)
            .await
            .unwrap_err();

        assert_eq!(err.key, "aws-config-inventory/current/resources-excel.csv");
        // summary is never attempted once a current write fails
        assert!(store
            .artifact("aws-config-inventory/current/summary.json")
            .is_none());
    }
}
