//! ctseg-ui - CT segmentation comparison browser
//!
//! Serves a localhost web UI over the run catalog: pick a base image,
//! pick two segmentation runs, execute a c3d overlap, browse the
//! contoured slices.

use anyhow::Result;
use clap::Parser;
use ctseg_common::config::CtsegConfig;
use ctseg_common::db;
use ctseg_ui::c3d::C3dClient;
use ctseg_ui::{build_router, AppState};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ctseg-ui", about = "CT segmentation comparison browser", version)]
struct Args {
    /// Port to listen on (localhost only)
    #[arg(long, default_value_t = 5730)]
    port: u16,

    /// Image data root (overrides CTSEG_DATA_ROOT and the config file)
    #[arg(long)]
    data_root: Option<PathBuf>,

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
        "Starting ctSeg UI (ctseg-ui) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = CtsegConfig::resolve(args.data_root.as_deref(), args.database.as_deref());
    info!("Data root: {}", config.data_root.display());
    info!("Database path: {}", config.database.display());

    let pool = db::init_database(&config.database).await?;

    let c3d = C3dClient::new(config.c3d_paths);
    if c3d.is_available() {
        info!("✓ c3d binary found");
    } else {
        warn!("c3d binary not found; comparisons will fail until it is installed");
    }

    let state = AppState::new(pool, config.data_root, c3d);
    let app = build_router(state);

    let addr = format!("127.0.0.1:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("ctseg-ui listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
