//! Browsing and restoring historical (gzip) inventory archives.

use std::path::{Path, PathBuf};

use crate::error::ArchiveError;
use crate::out::gzip;
use crate::store::{ObjectStore, ObjectSummary};

pub const DEFAULT_HISTORICAL_PREFIX: &str = "aws-config-inventory/historical/";

/// Compressed objects under `prefix`, sorted by key.
pub async fn list_archives(
    store: &dyn ObjectStore,
    prefix: &str,
) -> Result<Vec<ObjectSummary>, ArchiveError> {
    let mut found: Vec<ObjectSummary> = store
        .list(prefix)
        .await?
        .into_iter()
        .filter(|o| o.key.ends_with(".gz"))
        .collect();
    found.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(found)
}

/// Outcome of restoring one archive to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreReport {
    pub output: PathBuf,
    pub original_size: usize,
    pub compressed_size: usize,
}

impl RestoreReport {
    /// Space saved by compression, in percent.
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_size as f64 / self.original_size as f64) * 100.0
    }
}

/// File name of `key` with the trailing `.gz` removed.
pub fn default_output_name(key: &str) -> PathBuf {
    let name = Path::new(key)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(key);
    PathBuf::from(name.strip_suffix(".gz").unwrap_or(name))
}

/// Downloads `key`, gunzips it and writes it to `output` (or the key's file
/// name without `.gz`).
pub async fn restore_archive(
    store: &dyn ObjectStore,
    key: &str,
    output: Option<&Path>,
) -> Result<RestoreReport, ArchiveError> {
    let object = store.get(key).await?;
    let restored = gzip::decompress(&object.body).map_err(|source| ArchiveError::Decompress {
        key: key.to_string(),
        source,
    })?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_name(key));
    tokio::fs::write(&output, &restored)
        .await
        .map_err(|source| ArchiveError::Write {
            path: output.clone(),
            source,
        })?;

    Ok(RestoreReport {
        output,
        original_size: restored.len(),
        compressed_size: object.body.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_strips_directories_and_gz() {
        assert_eq!(
            default_output_name("aws-config-inventory/historical/resources_20250101_000000.csv.gz"),
            PathBuf::from("resources_20250101_000000.csv")
        );
        assert_eq!(default_output_name("plain.txt"), PathBuf::from("plain.txt"));
    }

    #[test]
    fn ratio_handles_empty_originals() {
        let report = RestoreReport {
            output: PathBuf::from("x"),
            original_size: 0,
            compressed_size: 20,
        };
        assert_eq!(report.compression_ratio(), 0.0);

        let report = RestoreReport {
            output: PathBuf::from("x"),
            original_size: 1000,
            compressed_size: 250,
        };
        assert!((report.compression_ratio() - 75.0).abs() < f64::EPSILON);
    }
}
