//! Application setup and initialization
//!
//! Everything `main` needs to turn a [`Config`] into a running router.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::PgVideoRepository;
use tubely_processing::{FfmpegRemuxer, FfprobeProber};

pub use routes::build_router;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let (assets, objects) = storage::setup_storage(&config).await?;

    let prober = FfprobeProber::new(config.ffprobe_path()).context("Invalid FFPROBE_PATH")?;
    let remuxer = FfmpegRemuxer::new(config.ffmpeg_path()).context("Invalid FFMPEG_PATH")?;

    let state = Arc::new(AppState {
        videos: Arc::new(PgVideoRepository::new(pool.clone())),
        assets,
        objects,
        prober: Arc::new(prober),
        remuxer: Arc::new(remuxer),
        pool: Some(pool),
        config,
    });

    let router = build_router(state.clone());

    Ok((state, router))
}
