//! Camera capture module
//!
//! Provides cross-platform camera capture using the nokhwa crate. A
//! [`FrameSource`] hands out one RGB frame per call; the pipeline owns its
//! source exclusively and releases it when dropped.

use std::fmt;

use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::Camera;

use crate::config::CameraConfig;

/// Errors raised while acquiring frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The device could not be opened
    OpenFailed(String),
    /// The device opened but streaming could not start
    StreamFailed(String),
    /// Reading a frame failed
    FrameFailed(String),
    /// A frame was read but could not be decoded to RGB
    DecodeFailed(String),
    /// The source has no more frames
    Closed,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::OpenFailed(msg) => write!(f, "Failed to open camera: {}", msg),
            CaptureError::StreamFailed(msg) => write!(f, "Failed to open camera stream: {}", msg),
            CaptureError::FrameFailed(msg) => write!(f, "Failed to capture frame: {}", msg),
            CaptureError::DecodeFailed(msg) => write!(f, "Failed to decode frame: {}", msg),
            CaptureError::Closed => write!(f, "Frame source closed"),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Anything that yields raw RGB frames on demand
pub trait FrameSource {
    /// Block until the next frame is available
    ///
    /// An error ends the current pipeline run.
    fn read_frame(&mut self) -> Result<RgbImage, CaptureError>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn read_frame(&mut self) -> Result<RgbImage, CaptureError> {
        (**self).read_frame()
    }
}

/// Information about an available camera
#[derive(Clone, Debug)]
pub struct CameraInfo {
    /// Camera index
    pub index: u32,
    /// Camera name
    pub name: String,
}

/// List available cameras
pub fn list_cameras() -> Vec<CameraInfo> {
    match nokhwa::query(ApiBackend::Auto) {
        Ok(camera_list) => camera_list
            .iter()
            .enumerate()
            .map(|(idx, info)| CameraInfo {
                index: idx as u32,
                name: info.human_name().to_string(),
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to enumerate cameras: {:?}", e);
            Vec::new()
        }
    }
}

/// A physical camera opened through nokhwa
///
/// The stream is stopped when the value is dropped.
pub struct CameraSource {
    camera: Camera,
    frame_count: u64,
}

impl CameraSource {
    /// Open a camera as close as possible to the requested format
    pub fn open(config: &CameraConfig) -> Result<Self, CaptureError> {
        let index = CameraIndex::Index(config.index);

        let closest = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(config.width, config.height),
                FrameFormat::MJPEG,
                config.fps,
            ),
        ));

        let mut camera = match Camera::new(index.clone(), closest) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    "Failed to open camera {} at {}x{}@{}: {:?}",
                    config.index,
                    config.width,
                    config.height,
                    config.fps,
                    e
                );

                // Last resort: whatever format the device offers
                let any = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
                Camera::new(index, any).map_err(|e| CaptureError::OpenFailed(e.to_string()))?
            }
        };

        camera
            .open_stream()
            .map_err(|e| CaptureError::StreamFailed(e.to_string()))?;

        tracing::info!(
            "Camera opened: {} ({}x{} @ {} fps)",
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height(),
            camera.frame_rate()
        );

        Ok(Self {
            camera,
            frame_count: 0,
        })
    }

    /// Frames read so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl FrameSource for CameraSource {
    fn read_frame(&mut self) -> Result<RgbImage, CaptureError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CaptureError::FrameFailed(e.to_string()))?;

        let width = buffer.resolution().width();
        let height = buffer.resolution().height();

        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::DecodeFailed(e.to_string()))?;

        self.frame_count += 1;

        // Rebuild through raw bytes so nokhwa's image version never leaks out
        RgbImage::from_raw(width, height, decoded.into_raw()).ok_or_else(|| {
            CaptureError::DecodeFailed(format!("buffer does not match {}x{}", width, height))
        })
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!("Failed to stop camera stream: {:?}", e);
        }
        tracing::info!("Camera released after {} frames", self.frame_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Solid(u8);

    impl FrameSource for Solid {
        fn read_frame(&mut self) -> Result<RgbImage, CaptureError> {
            Ok(RgbImage::from_pixel(4, 2, image::Rgb([self.0; 3])))
        }
    }

    #[test]
    fn test_boxed_source_forwards() {
        let mut source: Box<dyn FrameSource> = Box::new(Solid(7));
        let frame = source.read_frame().unwrap();
        assert_eq!(frame.dimensions(), (4, 2));
        assert_eq!(frame.get_pixel(0, 0).0, [7, 7, 7]);
    }

    #[test]
    fn test_capture_error_display() {
        assert_eq!(CaptureError::Closed.to_string(), "Frame source closed");
        assert_eq!(
            CaptureError::FrameFailed("timeout".into()).to_string(),
            "Failed to capture frame: timeout"
        );
    }
}
