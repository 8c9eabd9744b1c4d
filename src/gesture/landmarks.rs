//! Hand landmark types
//!
//! A hand is described by 21 keypoints in normalized image coordinates,
//! indexed by anatomical position (MediaPipe hand landmark convention).

use std::fmt;

/// Number of keypoints in one hand skeleton
pub const LANDMARK_COUNT: usize = 21;

/// Hand landmark indices
#[allow(dead_code)]
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

use index::*;

/// Fingertip indices, thumb first
pub const FINGER_TIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Joint each fingertip is compared against, thumb first
pub const FINGER_PIPS: [usize; 5] = [THUMB_IP, INDEX_PIP, MIDDLE_PIP, RING_PIP, PINKY_PIP];

/// Hand skeleton connections for drawing
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
    (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (MIDDLE_MCP, RING_MCP), (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
    (RING_MCP, PINKY_MCP), (WRIST, PINKY_MCP), (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP),
    (PINKY_DIP, PINKY_TIP),
];

/// A single hand landmark
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    /// X coordinate (0.0 to 1.0, normalized to image width)
    pub x: f32,
    /// Y coordinate (0.0 to 1.0, normalized to image height, increasing downward)
    pub y: f32,
    /// Depth relative to the wrist
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Distance to another landmark in the image plane (z ignored)
    pub fn planar_distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Errors raised when building a hand from raw points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandmarkError {
    /// The point list does not hold exactly 21 landmarks
    InvalidLandmarkCount { expected: usize, actual: usize },
}

impl fmt::Display for LandmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LandmarkError::InvalidLandmarkCount { expected, actual } => {
                write!(f, "Invalid landmark count: expected {}, got {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for LandmarkError {}

/// The 21-point skeleton of one detected hand in one frame
#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarkSet {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarkSet {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build a hand from an arbitrary point list, rejecting wrong lengths
    pub fn from_points(points: &[Landmark]) -> Result<Self, LandmarkError> {
        let points: [Landmark; LANDMARK_COUNT] =
            points
                .try_into()
                .map_err(|_| LandmarkError::InvalidLandmarkCount {
                    expected: LANDMARK_COUNT,
                    actual: points.len(),
                })?;
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    pub fn get(&self, idx: usize) -> &Landmark {
        &self.points[idx]
    }

    pub fn get_mut(&mut self, idx: usize) -> &mut Landmark {
        &mut self.points[idx]
    }

    /// All landmarks as pixel coordinates for a frame of the given size
    pub fn to_pixels(&self, width: u32, height: u32) -> [(f32, f32); LANDMARK_COUNT] {
        self.points
            .map(|lm| (lm.x * width as f32, lm.y * height as f32))
    }
}

impl std::ops::Index<usize> for HandLandmarkSet {
    type Output = Landmark;

    fn index(&self, idx: usize) -> &Landmark {
        &self.points[idx]
    }
}
