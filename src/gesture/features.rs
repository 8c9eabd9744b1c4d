//! Finger extension features
//!
//! Thumb: extended when its tip lies left of its IP joint. This assumes a
//! right hand in a mirrored (selfie) frame.
//! Other fingers: extended when the tip is above the PIP joint (smaller y).

use super::landmarks::{HandLandmarkSet, Landmark, LandmarkError, FINGER_PIPS, FINGER_TIPS};

/// Finger slots in a [`FingerState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Thumb = 0,
    Index = 1,
    Middle = 2,
    Ring = 3,
    Pinky = 4,
}

/// Extension state of [thumb, index, middle, ring, pinky]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FingerState([bool; 5]);

impl FingerState {
    pub const fn new(fingers: [bool; 5]) -> Self {
        Self(fingers)
    }

    /// Derive the extension vector from a hand
    pub fn from_hand(hand: &HandLandmarkSet) -> Self {
        let mut fingers = [false; 5];

        let thumb_tip = hand[FINGER_TIPS[0]];
        let thumb_ip = hand[FINGER_PIPS[0]];
        fingers[0] = thumb_tip.x < thumb_ip.x;

        for i in 1..5 {
            fingers[i] = hand[FINGER_TIPS[i]].y < hand[FINGER_PIPS[i]].y;
        }

        Self(fingers)
    }

    pub fn is_extended(&self, finger: Finger) -> bool {
        self.0[finger as usize]
    }

    pub fn thumb(&self) -> bool {
        self.0[0]
    }

    /// The four non-thumb fingers
    pub fn fingers(&self) -> &[bool] {
        &self.0[1..]
    }

    pub fn all_extended(&self) -> bool {
        self.0.iter().all(|&f| f)
    }

    pub fn none_extended(&self) -> bool {
        !self.0.iter().any(|&f| f)
    }

    pub fn extended_count(&self) -> usize {
        self.0.iter().filter(|&&f| f).count()
    }

    pub fn as_array(&self) -> [bool; 5] {
        self.0
    }
}

/// Extract finger states from a raw point list
///
/// Fails when the list is not exactly 21 points long.
pub fn extract_finger_state(points: &[Landmark]) -> Result<FingerState, LandmarkError> {
    let hand = HandLandmarkSet::from_points(points)?;
    Ok(FingerState::from_hand(&hand))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::landmarks::{index, LANDMARK_COUNT};

    /// Hand with every joint at the centre; callers move tips around
    fn neutral_points() -> Vec<Landmark> {
        vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT]
    }

    #[test]
    fn test_all_curled_on_neutral_hand() {
        let state = extract_finger_state(&neutral_points()).unwrap();
        assert!(state.none_extended());
        assert_eq!(state.as_array().len(), 5);
    }

    #[test]
    fn test_thumb_uses_x_axis() {
        let mut points = neutral_points();
        points[index::THUMB_TIP].x = 0.4;
        let state = extract_finger_state(&points).unwrap();
        assert!(state.thumb());

        points[index::THUMB_TIP].x = 0.6;
        let state = extract_finger_state(&points).unwrap();
        assert!(!state.thumb());
    }

    #[test]
    fn test_thumb_ignores_y_axis() {
        let mut points = neutral_points();
        points[index::THUMB_TIP].y = 0.1;
        let state = extract_finger_state(&points).unwrap();
        assert!(!state.thumb());
    }

    #[test]
    fn test_fingers_use_y_axis() {
        let mut points = neutral_points();
        points[index::INDEX_TIP].y = 0.3;
        points[index::PINKY_TIP].y = 0.3;
        points[index::MIDDLE_TIP].y = 0.7;
        let state = extract_finger_state(&points).unwrap();
        assert_eq!(state.as_array(), [false, true, false, false, true]);
        assert!(state.is_extended(Finger::Index));
        assert!(!state.is_extended(Finger::Middle));
        assert_eq!(state.extended_count(), 2);
    }

    #[test]
    fn test_equal_tip_and_pip_is_curled() {
        let mut points = neutral_points();
        points[index::RING_TIP].y = points[index::RING_PIP].y;
        let state = extract_finger_state(&points).unwrap();
        assert!(!state.is_extended(Finger::Ring));
    }

    #[test]
    fn test_malformed_input_rejected() {
        let points = vec![Landmark::default(); 5];
        let err = extract_finger_state(&points).unwrap_err();
        assert_eq!(
            err,
            LandmarkError::InvalidLandmarkCount { expected: 21, actual: 5 }
        );
    }
}
