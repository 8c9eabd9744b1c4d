//! Gesture recognition
//!
//! Turns one hand's landmarks into a finger extension vector and then into a
//! single gesture label via a fixed-priority rule cascade.

pub mod classifier;
pub mod features;
pub mod landmarks;

pub use classifier::GestureClassifier;
pub use features::{extract_finger_state, FingerState};
pub use landmarks::{HandLandmarkSet, Landmark, LandmarkError, LANDMARK_COUNT};

use serde::{Serialize, Serializer};

/// Recognized static hand gestures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gesture {
    /// No rule matched, or no hand visible
    #[default]
    None,
    ThumbsUp,
    ThumbsDown,
    Peace,
    OpenPalm,
    Fist,
    PointingUp,
    OkSign,
    RockOn,
    PinkyUp,
}

impl Gesture {
    pub const ALL: [Gesture; 10] = [
        Gesture::None,
        Gesture::ThumbsUp,
        Gesture::ThumbsDown,
        Gesture::Peace,
        Gesture::OpenPalm,
        Gesture::Fist,
        Gesture::PointingUp,
        Gesture::OkSign,
        Gesture::RockOn,
        Gesture::PinkyUp,
    ];

    /// Identifier used in the status API and the frame overlay
    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::None => "none",
            Gesture::ThumbsUp => "thumbs_up",
            Gesture::ThumbsDown => "thumbs_down",
            Gesture::Peace => "peace",
            Gesture::OpenPalm => "open_palm",
            Gesture::Fist => "fist",
            Gesture::PointingUp => "pointing_up",
            Gesture::OkSign => "ok_sign",
            Gesture::RockOn => "rock_on",
            Gesture::PinkyUp => "pinky_up",
        }
    }

    /// Display glyph (emoji) paired with this gesture
    pub fn glyph(&self) -> &'static str {
        match self {
            Gesture::None => "\u{1F914}",
            Gesture::ThumbsUp => "\u{1F44D}",
            Gesture::ThumbsDown => "\u{1F44E}",
            Gesture::Peace => "\u{270C}\u{FE0F}",
            Gesture::OpenPalm => "\u{1F590}\u{FE0F}",
            Gesture::Fist => "\u{270A}",
            Gesture::PointingUp => "\u{1F446}",
            Gesture::OkSign => "\u{1F44C}",
            Gesture::RockOn => "\u{1F918}",
            Gesture::PinkyUp => "\u{1F919}",
        }
    }

    pub fn from_name(name: &str) -> Option<Gesture> {
        Gesture::ALL.into_iter().find(|g| g.as_str() == name)
    }
}

impl std::fmt::Display for Gesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Gesture {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Gesture label and its glyph, produced once per processed frame
///
/// The glyph is always derived from the gesture, so the pair can never
/// disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecognitionResult {
    gesture: Gesture,
}

impl RecognitionResult {
    pub const NONE: RecognitionResult = RecognitionResult { gesture: Gesture::None };

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn glyph(&self) -> &'static str {
        self.gesture.glyph()
    }

    /// Overlay text, glyph first
    pub fn label(&self) -> String {
        format!("{} {}", self.glyph(), self.gesture.as_str())
    }
}

impl From<Gesture> for RecognitionResult {
    fn from(gesture: Gesture) -> Self {
        Self { gesture }
    }
}
