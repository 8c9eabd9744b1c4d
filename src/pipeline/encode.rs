//! JPEG encoding and multipart framing
//!
//! Each emitted element is one self-delimited part of a
//! `multipart/x-mixed-replace` body:
//! `--frame\r\nContent-Type: image/jpeg\r\n\r\n<jpeg>\r\n`.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

/// Multipart boundary token
pub const BOUNDARY: &str = "frame";

/// Content type of the full stream response
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// JPEG encoding failure
#[derive(Debug)]
pub struct EncodeError(image::ImageError);

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to encode frame: {}", self.0)
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<image::ImageError> for EncodeError {
    fn from(e: image::ImageError) -> Self {
        EncodeError(e)
    }
}

/// One multipart part ready for the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    part: Bytes,
    payload_len: usize,
}

impl EncodedFrame {
    /// Frame a compressed image
    pub fn from_jpeg(jpeg: &[u8]) -> Self {
        let header = format!("--{}\r\nContent-Type: image/jpeg\r\n\r\n", BOUNDARY);
        let mut part = BytesMut::with_capacity(header.len() + jpeg.len() + 2);
        part.put_slice(header.as_bytes());
        part.put_slice(jpeg);
        part.put_slice(b"\r\n");

        Self {
            part: part.freeze(),
            payload_len: jpeg.len(),
        }
    }

    /// The JPEG bytes inside the part
    pub fn payload(&self) -> Bytes {
        let start = self.part.len() - 2 - self.payload_len;
        self.part.slice(start..start + self.payload_len)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.part
    }

    pub fn into_bytes(self) -> Bytes {
        self.part
    }
}

/// JPEG encoder with fixed quality
#[derive(Debug, Clone, Copy)]
pub struct FrameEncoder {
    quality: u8,
}

impl FrameEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn encode_jpeg(&self, frame: &RgbImage) -> Result<Vec<u8>, EncodeError> {
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.quality).encode_image(frame)?;
        Ok(jpeg)
    }

    pub fn encode(&self, frame: &RgbImage) -> Result<EncodedFrame, EncodeError> {
        Ok(EncodedFrame::from_jpeg(&self.encode_jpeg(frame)?))
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new(95)
    }
}
