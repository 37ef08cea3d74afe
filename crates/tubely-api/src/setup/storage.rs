//! Storage setup and initialization

use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_storage::{create_object_storage, LocalStorage, Storage};

/// Returns `(assets, objects)`: the thumbnail store under the assets root and
/// the configured video backend.
pub async fn setup_storage(config: &Config) -> Result<(Arc<dyn Storage>, Arc<dyn Storage>)> {
    let assets = LocalStorage::new(config.assets_root().to_path_buf(), config.assets_base_url())
        .await
        .context("Failed to prepare assets directory")?;
    tracing::info!(
        assets_root = %config.assets_root().display(),
        "Assets storage initialized"
    );

    let objects = create_object_storage(config)
        .await
        .context("Failed to initialize object storage")?;
    tracing::info!(
        backend = %objects.backend_type(),
        "Object storage initialized"
    );

    Ok((Arc::new(assets), objects))
}
