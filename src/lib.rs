pub mod config;
pub mod log;
pub mod pipeline;
pub mod providers;
pub mod rate_source;
pub mod rates;
pub mod store;
pub mod variance;

use anyhow::Result;
use pipeline::Pipeline;
use providers::ecb::EcbProvider;
use std::time::Duration;
use store::disk::FjallStore;
use tracing::{debug, info};

/// Runs one scheduled invocation end to end and prints the result payload.
///
/// Pipeline failures are part of the invocation contract (a 500 payload),
/// not errors of this function; only setup problems such as an unreadable
/// config or an unopenable store surface as `Err`.
pub async fn run(config_path: Option<&str>) -> Result<()> {
    info!("Exchange rate tracker starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let source = EcbProvider::new(&config.source_url, Duration::from_secs(config.timeout_secs));
    let store = FjallStore::open(&config.resolve_data_path()?, &config.table_name)?;
    let pipeline = Pipeline::new(&source, &store);

    let today = chrono::Utc::now().date_naive();
    let response = pipeline.handle(serde_json::Value::Null, today).await;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
