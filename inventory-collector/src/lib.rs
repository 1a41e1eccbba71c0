//! AWS Config resource inventory.
//!
//! Lists every configured resource kind through AWS Config (optionally via
//! an aggregator), writes the result as CSV and JSON reports to S3, and keeps
//! a gzip-compressed, timestamped history of every run.
//!
//! Stages, leaf to root:
//!
//! - [`out::gzip`]: compression of historical artifacts
//! - [`collectors`]: the AWS Config catalog and resource kind list
//! - [`collector_core`]: records, snapshots and the per-kind collector
//! - [`out`]: CSV, summary and consolidated encodings
//! - [`out::publish`]: current and historical uploads
//! - [`handler`]: one invocation end to end

pub mod archive;
pub mod collector_core;
pub mod collectors;
pub mod config;
pub mod error;
pub mod handler;
pub mod mock;
pub mod out;
pub mod s3;
pub mod store;
pub mod telemetry;
pub mod utils;
