//! Rule cascade classifier
//!
//! Predicates are evaluated in a fixed priority order and the first match
//! wins. Several predicates can hold for the same pose, so the order is the
//! tie-break policy.

use super::features::{Finger, FingerState};
use super::landmarks::{index, HandLandmarkSet};
use super::{Gesture, RecognitionResult};

/// Default thumb-tip to index-tip distance below which an OK sign is possible
pub const DEFAULT_OK_SIGN_THRESHOLD: f32 = 0.05;

/// Everything a predicate may look at
#[derive(Debug, Clone, Copy)]
pub struct PoseContext<'a> {
    pub hand: &'a HandLandmarkSet,
    pub fingers: FingerState,
    pub ok_sign_threshold: f32,
}

type Predicate = fn(&PoseContext<'_>) -> bool;

/// Priority-ordered rules. `Gesture::None` is the fallback and has no rule.
const CASCADE: [(Gesture, Predicate); 9] = [
    (Gesture::OkSign, is_ok_sign),
    (Gesture::ThumbsUp, is_thumbs_up),
    (Gesture::ThumbsDown, is_thumbs_down),
    (Gesture::Peace, is_peace),
    (Gesture::RockOn, is_rock_on),
    (Gesture::PointingUp, is_pointing_up),
    (Gesture::PinkyUp, is_pinky_up),
    (Gesture::OpenPalm, is_open_palm),
    (Gesture::Fist, is_fist),
];

fn only(fingers: &FingerState, pattern: [bool; 5]) -> bool {
    fingers.as_array() == pattern
}

fn is_ok_sign(ctx: &PoseContext<'_>) -> bool {
    let thumb_tip = ctx.hand[index::THUMB_TIP];
    let index_tip = ctx.hand[index::INDEX_TIP];
    let distance = thumb_tip.planar_distance(&index_tip);

    distance < ctx.ok_sign_threshold
        && ctx.fingers.is_extended(Finger::Middle)
        && ctx.fingers.is_extended(Finger::Ring)
        && ctx.fingers.is_extended(Finger::Pinky)
}

fn thumb_only(fingers: &FingerState) -> bool {
    fingers.thumb() && !fingers.fingers().iter().any(|&f| f)
}

// Equal tip and base y satisfies neither thumbs rule.
fn is_thumbs_up(ctx: &PoseContext<'_>) -> bool {
    thumb_only(&ctx.fingers) && ctx.hand[index::THUMB_TIP].y < ctx.hand[index::THUMB_MCP].y
}

fn is_thumbs_down(ctx: &PoseContext<'_>) -> bool {
    thumb_only(&ctx.fingers) && ctx.hand[index::THUMB_TIP].y > ctx.hand[index::THUMB_MCP].y
}

fn is_peace(ctx: &PoseContext<'_>) -> bool {
    only(&ctx.fingers, [false, true, true, false, false])
}

fn is_rock_on(ctx: &PoseContext<'_>) -> bool {
    only(&ctx.fingers, [false, true, false, false, true])
}

fn is_pointing_up(ctx: &PoseContext<'_>) -> bool {
    only(&ctx.fingers, [false, true, false, false, false])
}

fn is_pinky_up(ctx: &PoseContext<'_>) -> bool {
    only(&ctx.fingers, [false, false, false, false, true])
}

fn is_open_palm(ctx: &PoseContext<'_>) -> bool {
    ctx.fingers.all_extended()
}

fn is_fist(ctx: &PoseContext<'_>) -> bool {
    ctx.fingers.none_extended()
}

/// Stateless gesture classifier
#[derive(Debug, Clone, Copy)]
pub struct GestureClassifier {
    ok_sign_threshold: f32,
}

impl GestureClassifier {
    pub fn new(ok_sign_threshold: f32) -> Self {
        Self { ok_sign_threshold }
    }

    pub fn ok_sign_threshold(&self) -> f32 {
        self.ok_sign_threshold
    }

    /// Classify a hand, deriving its finger states first
    pub fn classify(&self, hand: &HandLandmarkSet) -> RecognitionResult {
        self.classify_with(hand, FingerState::from_hand(hand))
    }

    /// Classify a hand with precomputed finger states
    pub fn classify_with(&self, hand: &HandLandmarkSet, fingers: FingerState) -> RecognitionResult {
        let ctx = self.context(hand, fingers);
        let gesture = CASCADE
            .iter()
            .find(|(_, predicate)| predicate(&ctx))
            .map(|(gesture, _)| *gesture)
            .unwrap_or(Gesture::None);

        RecognitionResult::from(gesture)
    }

    /// Every gesture whose rule holds, in priority order
    pub fn matching(&self, hand: &HandLandmarkSet, fingers: FingerState) -> Vec<Gesture> {
        let ctx = self.context(hand, fingers);
        CASCADE
            .iter()
            .filter(|(_, predicate)| predicate(&ctx))
            .map(|(gesture, _)| *gesture)
            .collect()
    }

    /// Rule order, highest priority first
    pub fn priority() -> impl Iterator<Item = Gesture> {
        CASCADE.iter().map(|(gesture, _)| *gesture)
    }

    fn context<'a>(&self, hand: &'a HandLandmarkSet, fingers: FingerState) -> PoseContext<'a> {
        PoseContext {
            hand,
            fingers,
            ok_sign_threshold: self.ok_sign_threshold,
        }
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_OK_SIGN_THRESHOLD)
    }
}
