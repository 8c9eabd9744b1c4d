//! Gesture Stream - hand gesture recognition over a live camera feed
//!
//! Captures camera frames, detects hand landmarks with an ONNX hand landmark
//! model, classifies the pose into one of a fixed set of gestures, and
//! republishes the annotated frames as an MJPEG stream alongside the most
//! recently recognized gesture.

pub mod api;
pub mod camera;
pub mod config;
pub mod gesture;
pub mod ml;
pub mod pipeline;
pub mod state;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

pub use config::AppConfig;
pub use gesture::{FingerState, Gesture, GestureClassifier, HandLandmarkSet, Landmark, RecognitionResult};
pub use pipeline::FramePipeline;
pub use state::{CurrentState, CurrentStateHandle};
