//! In-memory frame sources, detectors and hand poses for tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::RgbImage;

use crate::camera::{CaptureError, FrameSource};
use crate::gesture::landmarks::index;
use crate::gesture::{HandLandmarkSet, Landmark, LANDMARK_COUNT};
use crate::ml::{DetectorError, HandDetector};

/// Yields `remaining` blank frames, then fails. Counts its own drops.
pub struct ScriptedSource {
    remaining: usize,
    released: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(frames: usize) -> (Self, ReleaseCounter) {
        let released = Arc::new(AtomicUsize::new(0));
        let source = Self {
            remaining: frames,
            released: released.clone(),
        };
        (source, ReleaseCounter(released))
    }

    /// Never runs out of frames
    pub fn endless() -> (Self, ReleaseCounter) {
        Self::new(usize::MAX)
    }
}

impl FrameSource for ScriptedSource {
    fn read_frame(&mut self) -> Result<RgbImage, CaptureError> {
        if self.remaining == 0 {
            return Err(CaptureError::Closed);
        }
        self.remaining -= 1;
        Ok(RgbImage::new(64, 48))
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// How many times a [`ScriptedSource`] was released
#[derive(Clone)]
pub struct ReleaseCounter(Arc<AtomicUsize>);

impl ReleaseCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Replays one detector response per frame, then reports no hands
pub struct ScriptedDetector {
    responses: Vec<Result<Vec<HandLandmarkSet>, DetectorError>>,
}

impl ScriptedDetector {
    pub fn new(responses: Vec<Result<Vec<HandLandmarkSet>, DetectorError>>) -> Self {
        Self {
            responses: responses.into_iter().rev().collect(),
        }
    }

    /// Every frame shows the same hands
    pub fn repeating(hands: Vec<HandLandmarkSet>) -> RepeatingDetector {
        RepeatingDetector(hands)
    }
}

impl HandDetector for ScriptedDetector {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<HandLandmarkSet>, DetectorError> {
        self.responses.pop().unwrap_or(Ok(Vec::new()))
    }
}

pub struct RepeatingDetector(Vec<HandLandmarkSet>);

impl HandDetector for RepeatingDetector {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<HandLandmarkSet>, DetectorError> {
        Ok(self.0.clone())
    }
}

/// Keeps a copy of every frame it is handed and counts resets
#[derive(Clone, Default)]
pub struct RecordingDetector {
    frames: Arc<parking_lot::Mutex<Vec<RgbImage>>>,
    resets: Arc<AtomicUsize>,
}

impl RecordingDetector {
    pub fn frames(&self) -> Vec<RgbImage> {
        self.frames.lock().clone()
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl HandDetector for RecordingDetector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<HandLandmarkSet>, DetectorError> {
        self.frames.lock().push(frame.clone());
        Ok(Vec::new())
    }

    fn reset(&mut self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hand with the given fingers extended, in [thumb, index, middle, ring, pinky] order
///
/// Thumb tip and thumb base share a height, so neither thumbs rule fires,
/// and the thumb tip sits far from the index tip.
pub fn hand(fingers: [bool; 5]) -> HandLandmarkSet {
    let mut points = [Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
    points[index::THUMB_TIP].x = if fingers[0] { 0.3 } else { 0.6 };
    let tips = [index::INDEX_TIP, index::MIDDLE_TIP, index::RING_TIP, index::PINKY_TIP];
    for (tip, &extended) in tips.iter().zip(&fingers[1..]) {
        points[*tip].y = if extended { 0.3 } else { 0.7 };
    }
    HandLandmarkSet::new(points)
}
