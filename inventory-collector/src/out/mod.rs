//! Report encodings of an [`InventorySnapshot`].
//!
//! One snapshot yields two CSV bodies that differ only in how the account id
//! column is rendered, a JSON summary, and a consolidated plain-text report.

pub mod gzip;
pub mod publish;

use chrono::SecondsFormat;
use serde::Serialize;
use std::fmt::Write as _;

use crate::collector_core::{InventorySnapshot, ResourceKindTally, ResourceRecord};
use crate::error::EncodeError;

pub const CSV_HEADER: [&str; 5] = [
    "ResourceType",
    "ResourceId",
    "ResourceName",
    "SourceAccountId",
    "SourceRegion",
];

/// Width account ids are padded to under [`AccountIdStyle::ZeroPadded`].
pub const ACCOUNT_ID_WIDTH: usize = 12;

/// How `SourceAccountId` is written so spreadsheets keep it as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountIdStyle {
    /// `="012345678901"`, a formula that evaluates to text.
    FormulaText,
    /// Left-padded with zeros to twelve characters.
    ZeroPadded,
}

impl AccountIdStyle {
    pub fn render(self, account_id: &str) -> String {
        match self {
            AccountIdStyle::FormulaText => format!("=\"{account_id}\""),
            AccountIdStyle::ZeroPadded => format!("{account_id:0>width$}", width = ACCOUNT_ID_WIDTH),
        }
    }

    /// Undoes [`AccountIdStyle::render`] for the formula wrapper; padded values
    /// come back as written.
    pub fn unwrap_value(self, rendered: &str) -> &str {
        match self {
            AccountIdStyle::FormulaText => rendered
                .strip_prefix("=\"")
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(rendered),
            AccountIdStyle::ZeroPadded => rendered,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AccountIdStyle::FormulaText => "formula-text",
            AccountIdStyle::ZeroPadded => "zero-padded-12",
        }
    }
}

/// URIs of the artifacts a run publishes, so the current summary points at
/// that run's archives. Historical entries depend on the layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryLinks {
    pub current_csv: String,
    pub current_excel_csv: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_csv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_excel_csv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_report: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventorySummary {
    pub timestamp: String,
    pub last_updated: String,
    pub total_resources: usize,
    pub resources_by_type: ResourceKindTally,
    #[serde(flatten)]
    pub links: SummaryLinks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

impl InventorySummary {
    pub fn from_snapshot(
        snapshot: &InventorySnapshot,
        environment: Option<&str>,
        links: SummaryLinks,
    ) -> Self {
        Self {
            timestamp: snapshot.timestamp(),
            last_updated: snapshot
                .generated_at()
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            total_resources: snapshot.total(),
            resources_by_type: snapshot.tally().clone(),
            links,
            environment: environment.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EncodedInventory {
    /// Primary CSV, account ids as [`AccountIdStyle::FormulaText`].
    pub csv: String,
    /// Spreadsheet CSV, account ids as [`AccountIdStyle::ZeroPadded`].
    pub excel_csv: String,
    pub summary: InventorySummary,
    /// `summary`, pretty-printed.
    pub summary_json: String,
    pub consolidated: String,
}

pub const PRIMARY_ACCOUNT_STYLE: AccountIdStyle = AccountIdStyle::FormulaText;
pub const EXCEL_ACCOUNT_STYLE: AccountIdStyle = AccountIdStyle::ZeroPadded;

pub fn encode(
    snapshot: &InventorySnapshot,
    environment: Option<&str>,
    links: SummaryLinks,
) -> Result<EncodedInventory, EncodeError> {
    let csv = write_csv(snapshot.records(), PRIMARY_ACCOUNT_STYLE)?;
    let excel_csv = write_csv(snapshot.records(), EXCEL_ACCOUNT_STYLE)?;
    let summary = InventorySummary::from_snapshot(snapshot, environment, links);
    let summary_json = serde_json::to_string_pretty(&summary)?;
    let consolidated = consolidated_report(&summary, &summary_json, &csv);

    Ok(EncodedInventory {
        csv,
        excel_csv,
        summary,
        summary_json,
        consolidated,
    })
}

/// Fully quoted, CRLF-terminated CSV with a header row, even when `records`
/// is empty.
pub fn write_csv(records: &[ResourceRecord], style: AccountIdStyle) -> Result<String, EncodeError> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    wtr.write_record(CSV_HEADER)?;
    for r in records {
        wtr.write_record([
            r.resource_type.as_str(),
            r.resource_id.as_str(),
            r.resource_name.as_str(),
            style.render(&r.source_account_id).as_str(),
            r.source_region.as_str(),
        ])?;
    }

    let bytes = wtr.into_inner().map_err(|e| EncodeError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

fn consolidated_report(summary: &InventorySummary, summary_json: &str, csv: &str) -> String {
    let rule = "=".repeat(72);
    let mut out = String::with_capacity(csv.len() + summary_json.len() + 512);

    // writes into a String cannot fail
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "AWS CONFIG RESOURCE INVENTORY");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Generated:       {}", summary.last_updated);
    let _ = writeln!(out, "Timestamp:       {}", summary.timestamp);
    let _ = writeln!(out, "Total resources: {}", summary.total_resources);
    if let Some(env) = &summary.environment {
        let _ = writeln!(out, "Environment:     {env}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[SUMMARY]");
    let _ = writeln!(out, "{summary_json}");
    let _ = writeln!(out);
    let _ = writeln!(out, "[RESOURCES]");
    out.push_str(csv);
    out
}
