//! State shared by all request handlers

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;

use crate::camera::{CameraSource, CaptureError, FrameSource};
use crate::config::{AppConfig, CameraConfig};
use crate::ml::SharedDetector;
use crate::state::{CurrentState, CurrentStateHandle};
use crate::telemetry::{StreamStats, StreamStatsHandle};

/// Opens a frame source for one stream
///
/// Called on the stream's own thread, so the returned source never crosses
/// threads.
pub type SourceFactory =
    Arc<dyn Fn(&CameraConfig) -> Result<Box<dyn FrameSource>, CaptureError> + Send + Sync>;

/// Handle cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub current: CurrentStateHandle,
    pub detector: SharedDetector,
    pub stats: StreamStatsHandle,
    pub open_source: SourceFactory,
    pub started_at: Instant,
    /// Flipped to `true` once the server starts shutting down
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// State backed by the physical camera
    pub fn new(config: AppConfig, detector: SharedDetector) -> Self {
        let open_source: SourceFactory = Arc::new(|camera: &CameraConfig| {
            CameraSource::open(camera).map(|source| Box::new(source) as Box<dyn FrameSource>)
        });
        Self::with_source(config, detector, open_source)
    }

    /// State with a custom frame source, e.g. a file or test pattern
    pub fn with_source(config: AppConfig, detector: SharedDetector, open_source: SourceFactory) -> Self {
        Self {
            config: Arc::new(config),
            current: Arc::new(CurrentState::new()),
            detector,
            stats: Arc::new(StreamStats::new()),
            open_source,
            started_at: Instant::now(),
            shutdown: Arc::new(watch::channel(false).0),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// End every open stream; streams started afterwards end immediately
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Receiver whose value turns `true` on shutdown
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}
