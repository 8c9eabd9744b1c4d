//! API response types

use serde::{Deserialize, Serialize};

/// `GET /current_gesture`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentGestureResponse {
    pub gesture: String,
    pub emoji: String,
}

impl From<crate::gesture::RecognitionResult> for CurrentGestureResponse {
    fn from(result: crate::gesture::RecognitionResult) -> Self {
        Self {
            gesture: result.gesture().as_str().to_string(),
            emoji: result.glyph().to_string(),
        }
    }
}

/// `GET /api/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub active_streams: usize,
    pub frames_emitted: u64,
    pub measured_fps: f32,
    pub target_fps: u32,
}

/// Body of non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
