use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use asin_watcher::scheduler::RefreshScheduler;
use asin_watcher::store::{HistoryStore, MemoryHistoryStore, SqliteHistoryStore};
use asin_watcher::web::{self, AppState};
use asin_watcher::{telemetry, AppConfig, Asin, ProductManager};

#[derive(Debug, Parser)]
#[command(name = "asin-watcher", version, about = "Track marketplace product prices over time")]
struct Cli {
    /// Directory holding default.toml / <RUN_MODE>.toml / local.toml
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    /// Keep history in memory instead of the configured database
    #[arg(long)]
    memory: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Record the current price of one product URL
    Track { url: String },
    /// Print the stored price history of a product
    History { asin: Asin },
    /// List tracked products
    Products,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config_dir)?;
    let _log_guard = telemetry::init_tracing(&config.logging)?;

    let store: Arc<dyn HistoryStore> = if cli.memory {
        info!("Using in-memory history store");
        Arc::new(MemoryHistoryStore::new())
    } else {
        Arc::new(SqliteHistoryStore::connect(&config.database).await?)
    };
    let product_manager = Arc::new(ProductManager::from_config(&config, store)?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, product_manager).await?,
        Command::Track { url } => {
            let tracked = product_manager.track_price(&url).await?;
            println!("{}", serde_json::to_string_pretty(&tracked)?);
        }
        Command::History { asin } => {
            let history = product_manager.get_history(&asin).await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        Command::Products => {
            let products = product_manager.list_products().await?;
            println!("{}", serde_json::to_string_pretty(&products)?);
        }
    }

    Ok(())
}

async fn serve(config: AppConfig, product_manager: Arc<ProductManager>) -> Result<()> {
    info!("Starting asin-watcher...");
    telemetry::init_metrics(&config.metrics)?;

    let mut scheduler = if config.scheduler.enabled {
        let mut scheduler = RefreshScheduler::new(
            Arc::clone(&product_manager),
            config.scheduler.clone(),
            config.scraper.max_concurrent_checks,
        )
        .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        None
    };

    web::serve(AppState::new(product_manager, config)).await?;

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    info!("Shutting down...");
    Ok(())
}
