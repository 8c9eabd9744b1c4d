//! Latest recognition result, shared between the frame pipeline and the
//! status query path.
//!
//! The pipeline is the only writer. Readers take a copy of the whole
//! (gesture, glyph) pair under the same lock, so a label is never observed
//! with another gesture's glyph.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::gesture::RecognitionResult;

/// Most recent recognition result
#[derive(Debug, Default)]
pub struct CurrentState {
    latest: RwLock<RecognitionResult>,
}

impl CurrentState {
    /// Starts at (none, glyph-for-none)
    pub fn new() -> Self {
        Self {
            latest: RwLock::new(RecognitionResult::NONE),
        }
    }

    /// Overwrite the current result
    pub fn publish(&self, result: RecognitionResult) {
        *self.latest.write() = result;
    }

    /// Point-in-time copy of the current result
    pub fn snapshot(&self) -> RecognitionResult {
        *self.latest.read()
    }
}

/// Type alias for the handle passed to the pipeline and the API
pub type CurrentStateHandle = Arc<CurrentState>;
