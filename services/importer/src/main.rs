//! Importer - Loads the mutual fund CSV export into the `funds` table
//!
//! Usage:
//!   DB_URL=postgres://... cargo run --bin importer -- --file Mutual_Funds.csv
//!
//!   # Preview without touching the database:
//!   cargo run --bin importer -- --file Mutual_Funds.csv --dry-run
//!
//! Exit status is non-zero only for startup failures (configuration, database
//! connection, unreadable input). Bad rows and failed batches are logged and
//! the run continues.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use importer::config::Config;
use importer::{import, DryRunStore, PgFundStore, RowSource, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};

#[derive(Parser, Debug)]
#[command(name = "importer", about = "Imports the mutual fund CSV into the database")]
struct Args {
    /// CSV file to import
    #[arg(long, default_value = "Mutual_Funds.csv")]
    file: PathBuf,

    /// Records per bulk insert
    #[arg(
        long,
        default_value_t = DEFAULT_BATCH_SIZE as u32,
        value_parser = clap::value_parser!(u32).range(1..=MAX_BATCH_SIZE as i64)
    )]
    batch_size: u32,

    /// Dry run - parse and validate without connecting to the database
    #[arg(long, default_value = "false")]
    dry_run: bool,
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = Config::from_env();
    init_tracing(&config.log_level);

    let batch_size = args.batch_size as usize;

    println!("=== Mutual Fund Importer ===");
    println!("File: {}", args.file.display());
    println!("Batch size: {}", batch_size);
    println!("Mode: {}", if args.dry_run { "dry-run" } else { "live" });

    if args.dry_run {
        let rows = RowSource::from_path(&args.file)?;
        let store = DryRunStore::default();
        let summary = import(rows, &store, batch_size).await;

        for (i, record) in store.samples().iter().enumerate() {
            println!("  [{}] {}", i + 1, serde_json::to_string(record)?);
        }

        println!("\n=== Dry Run Complete ===");
        println!("{}", summary);
        println!("Nothing was written to the database");
        return Ok(());
    }

    let db_url = config.db_url()?;

    tracing::info!("Connecting to database...");
    let store = PgFundStore::connect(db_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    let rows = match store.ensure_schema().await {
        Ok(()) => RowSource::from_path(&args.file),
        Err(e) => Err(anyhow::Error::new(e).context("Failed to prepare funds table")),
    };
    let rows = match rows {
        Ok(rows) => rows,
        Err(e) => {
            store.close().await;
            return Err(e);
        }
    };

    let summary = import(rows, &store, batch_size).await;

    println!("\n=== Import Complete ===");
    println!("{}", summary);

    store.close().await;
    Ok(())
}
