//! ML inference module
//!
//! Provides hand landmark detection using ONNX Runtime. The model is a
//! MediaPipe-compatible hand landmark network (e.g. from the PINTO Model Zoo)
//! taking a 224x224 RGB image and returning 21 keypoints plus a hand
//! presence score.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;
use ndarray::Array4;
use parking_lot::Mutex;

use crate::config::DetectorConfig;
use crate::gesture::{HandLandmarkSet, Landmark, LANDMARK_COUNT};

/// Model input edge length in pixels
const INPUT_SIZE: u32 = 224;

/// Errors that can occur while loading or running the detector
#[derive(Debug)]
pub enum DetectorError {
    /// The model file could not be located
    ModelNotFound(PathBuf),
    /// ONNX Runtime failed to initialize or load the model
    Load(String),
    /// Inference failed
    Inference(String),
    /// The model produced outputs of an unexpected shape
    InvalidOutput(String),
}

impl fmt::Display for DetectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorError::ModelNotFound(path) => {
                write!(f, "Hand landmark model not found: {}", path.display())
            }
            DetectorError::Load(msg) => write!(f, "Failed to load hand landmark model: {}", msg),
            DetectorError::Inference(msg) => write!(f, "Inference failed: {}", msg),
            DetectorError::InvalidOutput(msg) => write!(f, "Unexpected model output: {}", msg),
        }
    }
}

impl std::error::Error for DetectorError {}

/// Finds hands in an image
///
/// Landmarks are returned in normalized coordinates of the image passed in.
pub trait HandDetector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<HandLandmarkSet>, DetectorError>;

    /// Forget any per-stream tracking state before a new stream starts
    fn reset(&mut self) {}
}

impl<D: HandDetector + ?Sized> HandDetector for Box<D> {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<HandLandmarkSet>, DetectorError> {
        (**self).detect(frame)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// One loaded model shared by successive streams
impl<D: HandDetector + ?Sized> HandDetector for Arc<Mutex<D>> {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<HandLandmarkSet>, DetectorError> {
        self.lock().detect(frame)
    }

    fn reset(&mut self) {
        self.lock().reset()
    }
}

/// Detector handle stored in the server state
pub type SharedDetector = Arc<Mutex<dyn HandDetector + Send>>;

/// Detector used when no model is available; never sees a hand
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHandDetector;

impl HandDetector for NoHandDetector {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<HandLandmarkSet>, DetectorError> {
        Ok(Vec::new())
    }
}

/// Acceptance rule for presence scores
///
/// A new hand needs the detection confidence; a hand that was present in the
/// previous frame only needs the (lower) tracking confidence.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceGate {
    detection: f32,
    tracking: f32,
    tracking_active: bool,
}

impl ConfidenceGate {
    pub fn new(detection: f32, tracking: f32) -> Self {
        Self {
            detection,
            tracking,
            tracking_active: false,
        }
    }

    /// Decide on this frame's score and remember the outcome
    pub fn accept(&mut self, score: f32) -> bool {
        let threshold = if self.tracking_active {
            self.tracking
        } else {
            self.detection
        };
        self.tracking_active = score >= threshold;
        self.tracking_active
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking_active
    }

    /// Next hand needs the detection confidence again
    pub fn reset(&mut self) {
        self.tracking_active = false;
    }
}

/// Hand landmark detector backed by ONNX Runtime
pub struct OnnxHandDetector {
    session: ort::session::Session,
    gate: ConfidenceGate,
    max_num_hands: usize,
}

impl OnnxHandDetector {
    /// Initialize ONNX Runtime and load the model
    pub fn load(config: &DetectorConfig) -> Result<Self, DetectorError> {
        let model_path = find_model(&config.model_path)
            .ok_or_else(|| DetectorError::ModelNotFound(config.model_path.clone()))?;
        tracing::info!("Loading hand landmark model from {:?}", model_path);

        ort::init()
            .with_name("GestureStream")
            .commit()
            .map_err(|e| DetectorError::Load(format!("Failed to initialize ORT: {}", e)))?;

        let session = ort::session::Session::builder()
            .map_err(|e| DetectorError::Load(format!("Failed to create session builder: {}", e)))?
            .with_intra_threads(2)
            .map_err(|e| DetectorError::Load(format!("Failed to set threads: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| DetectorError::Load(e.to_string()))?;

        tracing::info!(
            detection = config.min_detection_confidence,
            tracking = config.min_tracking_confidence,
            max_hands = config.max_num_hands,
            "Hand landmark model ready"
        );

        Ok(Self {
            session,
            gate: ConfidenceGate::new(
                config.min_detection_confidence,
                config.min_tracking_confidence,
            ),
            max_num_hands: config.max_num_hands,
        })
    }

    fn run(&mut self, frame: &RgbImage) -> Result<Vec<Vec<f32>>, DetectorError> {
        let input = preprocess_frame_nhwc(frame, INPUT_SIZE, INPUT_SIZE);

        let input_array = Array4::from_shape_vec(
            (1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3),
            input,
        )
        .map_err(|e| DetectorError::Inference(format!("Failed to create input array: {}", e)))?;

        let input_tensor = ort::value::Tensor::from_array(input_array)
            .map_err(|e| DetectorError::Inference(format!("Failed to create tensor: {}", e)))?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e| DetectorError::Inference(e.to_string()))?;

        let mut tensors = Vec::new();
        for (name, value) in outputs.iter() {
            let (_shape, data) = value
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InvalidOutput(format!("{}: {}", name, e)))?;
            tensors.push(data.to_vec());
        }
        Ok(tensors)
    }
}

impl HandDetector for OnnxHandDetector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<HandLandmarkSet>, DetectorError> {
        let outputs = self.run(frame)?;
        let decoded = decode_outputs(&outputs, INPUT_SIZE as f32)?;

        if !self.gate.accept(decoded.presence) {
            return Ok(Vec::new());
        }

        let mut hands = vec![decoded.hand];
        hands.truncate(self.max_num_hands);
        Ok(hands)
    }

    fn reset(&mut self) {
        self.gate.reset();
    }
}

/// Decoded single-hand model output
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedHand {
    pub hand: HandLandmarkSet,
    /// Hand presence probability
    pub presence: f32,
}

/// Interpret raw model outputs
///
/// Expects one tensor of 63 values (x, y, z per landmark, in input pixels)
/// and a single-value presence score after it.
pub fn decode_outputs(outputs: &[Vec<f32>], input_size: f32) -> Result<DecodedHand, DetectorError> {
    let coords = outputs
        .iter()
        .find(|t| t.len() == LANDMARK_COUNT * 3)
        .ok_or_else(|| DetectorError::InvalidOutput("no 63-value landmark tensor".to_string()))?;

    let presence = outputs
        .iter()
        .find(|t| t.len() == 1)
        .map(|t| to_probability(t[0]))
        .ok_or_else(|| DetectorError::InvalidOutput("no presence score".to_string()))?;

    let points: Vec<Landmark> = coords
        .chunks_exact(3)
        .map(|c| Landmark::new(c[0] / input_size, c[1] / input_size, c[2] / input_size))
        .collect();

    let hand = HandLandmarkSet::from_points(&points)
        .map_err(|e| DetectorError::InvalidOutput(e.to_string()))?;

    Ok(DecodedHand { hand, presence })
}

/// Some exports emit a logit instead of a probability
fn to_probability(value: f32) -> f32 {
    if (0.0..=1.0).contains(&value) {
        value
    } else {
        1.0 / (1.0 + (-value).exp())
    }
}

/// Resize (nearest neighbour) to HWC float RGB in [0, 1]
fn preprocess_frame_nhwc(frame: &RgbImage, target_width: u32, target_height: u32) -> Vec<f32> {
    let mut output = vec![0.0f32; (target_width * target_height * 3) as usize];
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return output;
    }

    let x_ratio = width as f32 / target_width as f32;
    let y_ratio = height as f32 / target_height as f32;

    for y in 0..target_height {
        for x in 0..target_width {
            let src_x = ((x as f32 * x_ratio) as u32).min(width - 1);
            let src_y = ((y as f32 * y_ratio) as u32).min(height - 1);
            let pixel = frame.get_pixel(src_x, src_y);

            let out_idx = ((y * target_width + x) * 3) as usize;
            output[out_idx] = pixel[0] as f32 / 255.0;
            output[out_idx + 1] = pixel[1] as f32 / 255.0;
            output[out_idx + 2] = pixel[2] as f32 / 255.0;
        }
    }

    output
}

/// Locate a model file
///
/// Absolute paths are used as-is. Relative paths are tried against the
/// working directory, then the executable's directory and its ancestors
/// (for `cargo run` out of target/debug or target/release).
pub fn find_model(path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return path.exists().then(|| path.to_path_buf());
    }

    if let Ok(cwd) = std::env::current_dir() {
        let candidate = cwd.join(path);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    let exe_path = std::env::current_exe().ok()?;
    exe_path
        .ancestors()
        .skip(1)
        .take(4)
        .map(|dir| dir.join(path))
        .find(|candidate| candidate.exists())
}

/// Load the configured model, or fall back to a detector that never sees a hand
pub fn load_detector(config: &DetectorConfig) -> SharedDetector {
    match OnnxHandDetector::load(config) {
        Ok(detector) => Arc::new(Mutex::new(detector)),
        Err(e) => {
            tracing::warn!("{}. Gesture recognition disabled, frames will report 'none'.", e);
            Arc::new(Mutex::new(NoHandDetector))
        }
    }
}
