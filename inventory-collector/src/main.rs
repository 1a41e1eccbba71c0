use std::process::ExitCode;
use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_types::region::Region;
use inventory_collector::collector_core::ResourceCatalog;
use inventory_collector::collectors::{self, caller_account_id};
use inventory_collector::config::InventoryConfig;
use inventory_collector::handler::{run_inventory, InvocationResponse};
use inventory_collector::mock::StaticCatalog;
use inventory_collector::s3::S3Store;
use inventory_collector::telemetry::{init_logging, LogFormat};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_logging(LogFormat::from_env());

    let config = match InventoryConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            let resp = InvocationResponse::config_invalid(&e);
            println!("{}", serde_json::to_string_pretty(&resp)?);
            return Ok(ExitCode::FAILURE);
        }
    };

    let conf = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await;

    // execution identity only matters without the aggregator
    let execution_account = if config.use_aggregator {
        config.account_id.clone()
    } else {
        match caller_account_id(&conf).await {
            Ok(account) => account,
            Err(e) => {
                warn!(error = %e, fallback = %config.account_id, "caller identity lookup failed");
                config.account_id.clone()
            }
        }
    };
    let mode = config.catalog_mode(execution_account);

    // MOCK_MODE: canned catalog, real bucket
    let catalog: Arc<dyn ResourceCatalog> = if std::env::var("MOCK_MODE").is_ok() {
        info!("MOCK_MODE set, using the static demo catalog");
        Arc::new(StaticCatalog::demo())
    } else {
        collectors::build_catalog(&conf, mode.clone())
    };
    let store = S3Store::new(&conf, config.bucket.clone());

    let resp = run_inventory(&config, catalog, &mode, &store).await?;
    println!("{}", serde_json::to_string_pretty(&resp)?);
    Ok(ExitCode::SUCCESS)
}
