//! Configuration and serialization module.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::gesture::classifier::DEFAULT_OK_SIGN_THRESHOLD;

/// Errors raised while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io { path: PathBuf, source: std::io::Error },
    /// The file is not valid JSON for [`AppConfig`].
    Parse { path: PathBuf, source: serde_json::Error },
    /// A value is out of range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to read config {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config {}: {}", path.display(), source)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub camera: CameraConfig,
    pub pipeline: PipelineConfig,
    pub detector: DetectorConfig,
    pub classifier: ClassifierConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Camera device and the format requested from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device index (0 for default).
    pub index: u32,
    /// Requested frame width.
    pub width: u32,
    /// Requested frame height.
    pub height: u32,
    /// Frame rate hint for the device.
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

/// Frame pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum output frame rate.
    pub target_fps: u32,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            jpeg_quality: 95,
        }
    }
}

/// Hand landmark detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// ONNX hand landmark model.
    pub model_path: PathBuf,
    /// Score required to report a new hand.
    pub min_detection_confidence: f32,
    /// Score required to keep reporting a hand seen in the previous frame.
    pub min_tracking_confidence: f32,
    /// Maximum hands reported per frame.
    pub max_num_hands: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/hand_landmark.onnx"),
            min_detection_confidence: 0.7,
            min_tracking_confidence: 0.5,
            max_num_hands: 1,
        }
    }
}

/// Gesture classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Thumb-tip to index-tip distance (normalized) for the OK sign.
    pub ok_sign_threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            ok_sign_threshold: DEFAULT_OK_SIGN_THRESHOLD,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub default_level: String,
    pub json_format: bool,
    pub file_enabled: bool,
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            json_format: false,
            file_enabled: false,
            file_path: None,
        }
    }
}

impl AppConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse without validating. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Explicit path if given, else the user config file if present, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.pipeline.target_fps == 0 {
            return invalid("pipeline.target_fps must be at least 1");
        }
        if !(1..=100).contains(&self.pipeline.jpeg_quality) {
            return invalid("pipeline.jpeg_quality must be within 1..=100");
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return invalid("camera.width and camera.height must be non-zero");
        }
        if self.camera.fps == 0 {
            return invalid("camera.fps must be at least 1");
        }
        for (name, value) in [
            ("detector.min_detection_confidence", self.detector.min_detection_confidence),
            ("detector.min_tracking_confidence", self.detector.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{} must be within [0, 1]", name)));
            }
        }
        if self.detector.max_num_hands == 0 {
            return invalid("detector.max_num_hands must be at least 1");
        }
        let threshold = self.classifier.ok_sign_threshold;
        if threshold.is_nan() || threshold <= 0.0 {
            return invalid("classifier.ok_sign_threshold must be positive");
        }
        Ok(())
    }
}

/// `<config dir>/gesture-stream/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gesture-stream").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.pipeline.target_fps, 30);
        assert_eq!((config.camera.width, config.camera.height), (640, 480));
        assert_eq!(config.detector.min_detection_confidence, 0.7);
        assert_eq!(config.detector.min_tracking_confidence, 0.5);
        assert_eq!(config.detector.max_num_hands, 1);
        assert_eq!(config.classifier.ok_sign_threshold, 0.05);
        assert_eq!(config.server.port, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AppConfig::from_json(r#"{ "pipeline": { "target_fps": 15 } }"#).unwrap();
        assert_eq!(config.pipeline.target_fps, 15);
        assert_eq!(config.pipeline.jpeg_quality, 95);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.pipeline.target_fps = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.detector.min_detection_confidence = 1.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.classifier.ok_sign_threshold = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.pipeline.jpeg_quality = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mirroring_is_not_a_setting() {
        let config = AppConfig::from_json(r#"{ "pipeline": { "mirror": false, "target_fps": 20 } }"#).unwrap();
        assert_eq!(config.pipeline.target_fps, 20);

        let json = serde_json::to_value(&config).unwrap();
        assert!(json["pipeline"].get("mirror").is_none());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("gesture-stream-test-{}.json", std::process::id()));
        fs::write(&path, r#"{ "server": { "port": 8080 }, "camera": { "index": 2 } }"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.camera.index, 2);
        assert_eq!(config.server.host, "0.0.0.0");

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = AppConfig::load(Path::new("/nonexistent/gesture-stream.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_roundtrip_through_json() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert_eq!(AppConfig::from_json(&json).unwrap(), config);
    }
}
