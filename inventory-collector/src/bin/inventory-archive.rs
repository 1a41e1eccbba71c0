//! Lists and restores historical inventory archives.

use std::path::PathBuf;

use aws_config::BehaviorVersion;
use clap::{Parser, Subcommand};
use inventory_collector::archive::{list_archives, restore_archive, DEFAULT_HISTORICAL_PREFIX};
use inventory_collector::s3::S3Store;
use inventory_collector::telemetry::{init_logging, LogFormat};

/// Manage compressed AWS Config inventory archives.
#[derive(Debug, Parser)]
#[command(name = "inventory-archive")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List compressed archives under a prefix.
    List {
        /// Bucket holding the archives.
        #[arg(long, env = "S3_BUCKET")]
        bucket: String,
        /// Key prefix to search.
        #[arg(long, default_value = DEFAULT_HISTORICAL_PREFIX)]
        prefix: String,
    },
    /// Download and decompress one archive.
    Decompress {
        #[arg(long, env = "S3_BUCKET")]
        bucket: String,
        /// Key of the `.gz` object.
        #[arg(long)]
        key: String,
        /// Output file; defaults to the key's file name without `.gz`.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LogFormat::from_env());
    let cli = Cli::parse();
    let conf = aws_config::load_defaults(BehaviorVersion::latest()).await;

    match cli.command {
        Commands::List { bucket, prefix } => {
            let store = S3Store::new(&conf, bucket.clone());
            println!("Listing compressed archives in s3://{bucket}/{prefix}");
            println!("{}", "-".repeat(80));

            let archives = list_archives(&store, &prefix).await?;
            for a in &archives {
                let size_mb = a.size as f64 / (1024.0 * 1024.0);
                let modified = a
                    .last_modified
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}", a.key);
                println!("   size:     {size_mb:.2} MB");
                println!("   modified: {modified}");
                println!();
            }
            println!("Total compressed archives: {}", archives.len());
        }
        Commands::Decompress { bucket, key, output } => {
            let store = S3Store::new(&conf, bucket.clone());
            println!("Downloading s3://{bucket}/{key}");

            let report = restore_archive(&store, &key, output.as_deref()).await?;
            println!("Restored to:      {}", report.output.display());
            println!("Original size:    {} bytes", report.original_size);
            println!("Compressed size:  {} bytes", report.compressed_size);
            println!("Compression ratio: {:.1}%", report.compression_ratio());
        }
    }

    Ok(())
}
