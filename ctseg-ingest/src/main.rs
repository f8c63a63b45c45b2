//! ctseg-ingest - catalog database builder
//!
//! Scans a data root of NIfTI base images and per-team segmentation
//! runs and (re)builds the SQLite catalog the ctseg-ui service reads.

use anyhow::Result;
use clap::Parser;
use ctseg_common::config::CtsegConfig;
use ctseg_common::db;
use ctseg_ingest::{populate, TreeScanner};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ctseg-ingest", about = "Build the ctSeg catalog from a NIfTI tree", version)]
struct Args {
    /// Data root of base images and pairwise segmentations
    root: PathBuf,

    /// Catalog database path (overrides CTSEG_DATABASE and the config file)
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting ctSeg ingest (ctseg-ingest) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = CtsegConfig::resolve(Some(&args.root), args.database.as_deref());
    info!("Data root: {}", config.data_root.display());
    info!("Database path: {}", config.database.display());

    let pool = db::init_database(&config.database).await?;

    let collections = db::list_collections(&pool).await?;
    let teams = db::list_teams(&pool).await?;

    // The walk and the NIfTI checks are blocking work
    let scanner = TreeScanner::new(&config.data_root, &collections, &teams);
    let outcome = tokio::task::spawn_blocking(move || scanner.scan()).await??;

    let summary = populate(&pool, &outcome).await?;

    info!(
        "✓ Imported {} base images and {} runs across {} collections",
        summary.base_images, summary.challenges, summary.collections
    );
    if summary.skipped > 0 {
        warn!("{} run files were skipped during verification", summary.skipped);
    }

    Ok(())
}
