//! Telemetry and logging infrastructure
//!
//! Provides structured logging with tracing and output frame-rate metrics.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogConfig, LogGuard};
pub use metrics::{FrameRateMeter, FrameStats, StreamStats, StreamStatsHandle};
