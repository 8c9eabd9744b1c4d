//! HTTP surface for Gesture Stream
//!
//! Serves the annotated MJPEG stream, the most recent gesture, and a small
//! status endpoint.

pub mod routes;
pub mod server;
pub mod shared;
pub mod types;

pub use routes::create_router;
pub use server::{run_server, serve};
pub use shared::{AppState, SourceFactory};
pub use types::*;
