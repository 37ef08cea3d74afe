//! Application state shared by every request.

use sqlx::PgPool;
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::{MediaProber, Remuxer};
use tubely_storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub videos: Arc<dyn VideoRepository>,
    /// Thumbnail files under the assets root, served at `/assets`.
    pub assets: Arc<dyn Storage>,
    /// Object storage for uploaded videos.
    pub objects: Arc<dyn Storage>,
    pub prober: Arc<dyn MediaProber>,
    /// Only consulted when `VIDEO_FAST_START` is on.
    pub remuxer: Arc<dyn Remuxer>,
    /// Present in the server binary; absent when the repository is not Postgres-backed.
    pub pool: Option<PgPool>,
}
