//! Error types for the inventory pipeline.
//!
//! Each stage has its own error so the orchestrator can decide, per stage,
//! whether a failure is recovered locally or propagated to the caller.

use std::io;
use std::path::PathBuf;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Invalid or incomplete process configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid value for {name}: {value:?}")]
    Invalid {
        name: &'static str,
        value: String,
    },
}

impl ConfigError {
    /// Names of the missing required variables, in declaration order.
    #[must_use]
    pub fn missing_variables(&self) -> &[&'static str] {
        match self {
            Self::Missing(names) => names.as_slice(),
            Self::Invalid { .. } => &[],
        }
    }
}

/// Discovery of one resource kind failed.
#[derive(Debug, thiserror::Error)]
#[error("discovery failed for {kind}: {source}")]
pub struct DiscoveryError {
    pub kind: String,
    #[source]
    pub source: BoxError,
}

impl DiscoveryError {
    #[must_use]
    pub fn new(kind: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            kind: kind.into(),
            source: source.into(),
        }
    }
}

/// Object store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage error on {key}: {message}")]
    Backend {
        key: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl StoreError {
    #[must_use]
    pub fn backend(key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        let source = source.into();
        Self::Backend {
            key: key.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// A backend failure with no underlying error value.
    #[must_use]
    pub fn message(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            key: key.into(),
            message: message.into(),
            source: None,
        }
    }
}

/// A current-state artifact could not be written.
#[derive(Debug, thiserror::Error)]
#[error("failed to publish current artifact {key}")]
pub struct PublishError {
    /// Key of the artifact that failed.
    pub key: String,
    #[source]
    pub source: StoreError,
}

/// Report bodies could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("report buffer error: {0}")]
    Io(#[from] io::Error),

    #[error("report is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Fatal failures of one inventory run.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Failures of the historical archive utility.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to decompress {key}: {source}")]
    Decompress {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
