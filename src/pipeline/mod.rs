//! Frame pipeline
//!
//! Pulls frames from a [`FrameSource`], paces them to the target frame rate,
//! mirrors them, runs hand detection and gesture classification, draws the
//! overlays, and yields each frame as an encoded multipart part. The latest
//! recognition result is published to [`CurrentState`] on every frame.
//!
//! The pipeline is an [`Iterator`]: it ends the first time the source fails
//! to produce a frame, and it owns the source, so dropping the pipeline (or
//! exhausting it) releases the camera exactly once.
//!
//! [`CurrentState`]: crate::state::CurrentState

pub mod annotate;
pub mod encode;
pub mod font;
pub mod throttle;

pub use encode::{EncodedFrame, EncodeError, FrameEncoder, BOUNDARY, STREAM_CONTENT_TYPE};
pub use throttle::Throttle;

use image::imageops;
use image::RgbImage;

use crate::camera::FrameSource;
use crate::config::AppConfig;
use crate::gesture::{FingerState, GestureClassifier, RecognitionResult};
use crate::ml::HandDetector;
use crate::state::CurrentStateHandle;
use crate::telemetry::{FrameRateMeter, StreamStatsHandle};

/// How often the measured output rate is logged
const FPS_LOG_INTERVAL: u64 = 150;

/// Capture -> detect -> classify -> annotate -> encode
pub struct FramePipeline<S: FrameSource, D: HandDetector> {
    /// `None` once the source has ended and been released
    source: Option<S>,
    detector: D,
    classifier: GestureClassifier,
    throttle: Throttle,
    encoder: FrameEncoder,
    current: CurrentStateHandle,
    meter: FrameRateMeter,
    stats: Option<StreamStatsHandle>,
    frames_emitted: u64,
}

impl<S: FrameSource, D: HandDetector> FramePipeline<S, D> {
    /// The detector is reset so no tracking carries over from an earlier stream
    pub fn new(source: S, mut detector: D, current: CurrentStateHandle, config: &AppConfig) -> Self {
        detector.reset();
        Self {
            source: Some(source),
            detector,
            classifier: GestureClassifier::new(config.classifier.ok_sign_threshold),
            throttle: Throttle::new(config.pipeline.target_fps),
            encoder: FrameEncoder::new(config.pipeline.jpeg_quality),
            current,
            meter: FrameRateMeter::default(),
            stats: None,
            frames_emitted: 0,
        }
    }

    /// Report emitted frames to shared stream counters
    pub fn with_stats(mut self, stats: StreamStatsHandle) -> Self {
        stats.stream_started();
        self.stats = Some(stats);
        self
    }

    /// Whether the source is still held
    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    /// Output frame rate over the recent window
    pub fn measured_fps(&self) -> f64 {
        self.meter.fps()
    }

    /// Mirror, detect, classify, publish and annotate one raw frame
    ///
    /// Every detected hand gets a skeleton overlay; only the last hand's
    /// result is kept. No hands (or a detector failure) yields `none`.
    pub fn process_frame(&mut self, mut frame: RgbImage) -> (RgbImage, RecognitionResult) {
        // The thumb rule assumes a mirrored view
        imageops::flip_horizontal_in_place(&mut frame);

        let hands = match self.detector.detect(&frame) {
            Ok(hands) => hands,
            Err(e) => {
                tracing::warn!("Hand detection failed: {}", e);
                Vec::new()
            }
        };

        let mut result = RecognitionResult::NONE;
        for hand in &hands {
            annotate::draw_hand(&mut frame, hand);
            let fingers = FingerState::from_hand(hand);
            result = self.classifier.classify_with(hand, fingers);
        }

        self.current.publish(result);
        tracing::debug!(
            hands = hands.len(),
            gesture = result.gesture().as_str(),
            "Frame classified"
        );

        annotate::draw_label(
            &mut frame,
            &result.label(),
            annotate::LABEL_ORIGIN,
            annotate::LABEL_COLOR,
            annotate::LABEL_SCALE,
        );

        (frame, result)
    }

    /// Drop the source now rather than when the pipeline goes away
    fn release_source(&mut self) {
        if self.source.take().is_some() {
            tracing::info!(frames = self.frames_emitted, "Frame pipeline finished");
        }
    }

    fn record_emit(&mut self) {
        self.frames_emitted += 1;
        self.meter.mark_emitted();

        if let Some(stats) = &self.stats {
            stats.record_frame(self.meter.fps());
        }
        if self.frames_emitted % FPS_LOG_INTERVAL == 0 {
            let frame_stats = self.meter.stats();
            tracing::debug!(
                fps = format!("{:.1}", self.meter.fps()),
                avg_ms = format!("{:.1}", frame_stats.avg_ms),
                max_ms = format!("{:.1}", frame_stats.max_ms),
                "Output frame rate"
            );
        }
    }
}

impl<S: FrameSource, D: HandDetector> Iterator for FramePipeline<S, D> {
    type Item = EncodedFrame;

    fn next(&mut self) -> Option<EncodedFrame> {
        loop {
            let source = self.source.as_mut()?;

            let frame = match source.read_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::info!("Frame source ended: {}", e);
                    self.release_source();
                    return None;
                }
            };

            self.throttle.wait();

            let (annotated, _) = self.process_frame(frame);

            match self.encoder.encode(&annotated) {
                Ok(part) => {
                    self.record_emit();
                    return Some(part);
                }
                Err(e) => {
                    // Skip this frame, keep streaming
                    tracing::warn!("{}", e);
                }
            }
        }
    }
}

impl<S: FrameSource, D: HandDetector> std::iter::FusedIterator for FramePipeline<S, D> {}

impl<S: FrameSource, D: HandDetector> Drop for FramePipeline<S, D> {
    fn drop(&mut self) {
        self.release_source();
        if let Some(stats) = &self.stats {
            stats.stream_stopped();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use crate::gesture::Gesture;
    use crate::ml::{DetectorError, SharedDetector};
    use crate::state::CurrentState;
    use crate::telemetry::StreamStats;
    use crate::testing::{hand, RecordingDetector, ScriptedDetector, ScriptedSource};

    fn fast_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.pipeline.target_fps = 1000;
        config
    }

    #[test]
    fn test_ends_when_source_fails_and_releases_once() {
        let (source, released) = ScriptedSource::new(3);
        let current = Arc::new(CurrentState::new());
        let mut pipeline = FramePipeline::new(source, ScriptedDetector::new(vec![]), current, &fast_config());

        let frames: Vec<_> = pipeline.by_ref().collect();
        assert_eq!(frames.len(), 3);
        assert!(!pipeline.is_active());
        assert_eq!(released.get(), 1);

        assert!(pipeline.next().is_none());
        drop(pipeline);
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_abandoned_stream_releases_once() {
        let (source, released) = ScriptedSource::endless();
        let current = Arc::new(CurrentState::new());
        let mut pipeline = FramePipeline::new(source, ScriptedDetector::new(vec![]), current, &fast_config());

        assert!(pipeline.next().is_some());
        assert!(pipeline.next().is_some());
        assert_eq!(released.get(), 0);

        drop(pipeline);
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_output_rate_bounded_by_target() {
        let (source, _) = ScriptedSource::endless();
        let mut config = AppConfig::default();
        config.pipeline.target_fps = 50;
        let current = Arc::new(CurrentState::new());
        let pipeline = FramePipeline::new(source, ScriptedDetector::new(vec![]), current, &config);

        let start = Instant::now();
        let emitted = pipeline.take(10).count();
        let elapsed = start.elapsed();

        assert_eq!(emitted, 10);
        // 10 frames at 20 ms spacing, minus a little scheduling slack
        assert!(elapsed >= Duration::from_millis(190), "elapsed {:?}", elapsed);
    }

    #[test]
    fn test_publishes_last_hand_result() {
        let (source, _) = ScriptedSource::new(1);
        let current = Arc::new(CurrentState::new());
        let detector = ScriptedDetector::new(vec![Ok(vec![
            hand([false; 5]),
            hand([false, true, true, false, false]),
        ])]);
        let mut pipeline = FramePipeline::new(source, detector, current.clone(), &fast_config());

        assert!(pipeline.next().is_some());
        assert_eq!(current.snapshot().gesture(), Gesture::Peace);
    }

    #[test]
    fn test_no_hands_resets_to_none() {
        let (source, _) = ScriptedSource::new(2);
        let current = Arc::new(CurrentState::new());
        current.publish(Gesture::OpenPalm.into());

        let detector = ScriptedDetector::new(vec![Ok(vec![hand([true; 5])]), Ok(vec![])]);
        let mut pipeline = FramePipeline::new(source, detector, current.clone(), &fast_config());

        pipeline.next();
        assert_eq!(current.snapshot().gesture(), Gesture::OpenPalm);
        pipeline.next();
        assert_eq!(current.snapshot(), RecognitionResult::NONE);
    }

    #[test]
    fn test_detector_failure_counts_as_no_hand() {
        let (source, _) = ScriptedSource::new(1);
        let current = Arc::new(CurrentState::new());
        current.publish(Gesture::Fist.into());

        let detector = ScriptedDetector::new(vec![Err(DetectorError::Inference("boom".into()))]);
        let mut pipeline = FramePipeline::new(source, detector, current.clone(), &fast_config());

        assert!(pipeline.next().is_some(), "a detector failure must not end the stream");
        assert_eq!(current.snapshot(), RecognitionResult::NONE);
    }

    #[test]
    fn test_frame_is_mirrored_before_detection() {
        let mut frame = RgbImage::new(4, 1);
        frame.put_pixel(0, 0, image::Rgb([255, 255, 255]));

        let (source, _) = ScriptedSource::new(0);
        let current = Arc::new(CurrentState::new());
        let detector = RecordingDetector::default();
        let mut pipeline = FramePipeline::new(source, detector.clone(), current, &fast_config());

        let (out, result) = pipeline.process_frame(frame);
        assert_eq!(result, RecognitionResult::NONE);

        let seen = detector.frames();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].get_pixel(3, 0).0, [255, 255, 255], "detector saw an unflipped frame");
        assert_eq!(seen[0].get_pixel(0, 0).0, [0, 0, 0]);

        assert_eq!(out.get_pixel(3, 0).0, [255, 255, 255]);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_new_pipeline_resets_shared_detector() {
        let recorder = RecordingDetector::default();
        let shared: SharedDetector = Arc::new(parking_lot::Mutex::new(recorder.clone()));
        let current = Arc::new(CurrentState::new());

        let (first, _) = ScriptedSource::new(1);
        FramePipeline::new(first, shared.clone(), current.clone(), &fast_config()).for_each(drop);
        assert_eq!(recorder.resets(), 1);

        let (second, _) = ScriptedSource::new(1);
        let _pipeline = FramePipeline::new(second, shared, current, &fast_config());
        assert_eq!(recorder.resets(), 2);
    }

    #[test]
    fn test_emitted_parts_are_framed_jpegs() {
        let (source, _) = ScriptedSource::new(1);
        let current = Arc::new(CurrentState::new());
        let mut pipeline = FramePipeline::new(source, ScriptedDetector::new(vec![]), current, &fast_config());

        let part = pipeline.next().unwrap();
        assert!(part.as_bytes().starts_with(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n"));
        assert!(part.as_bytes().ends_with(b"\r\n"));
        let decoded = image::load_from_memory(&part.payload()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn test_stream_stats_track_lifecycle() {
        let (source, _) = ScriptedSource::new(2);
        let stats = Arc::new(StreamStats::new());
        let current = Arc::new(CurrentState::new());
        let pipeline = FramePipeline::new(source, ScriptedDetector::new(vec![]), current, &fast_config())
            .with_stats(stats.clone());

        assert_eq!(stats.active_streams(), 1);
        assert_eq!(pipeline.count(), 2);
        assert_eq!(stats.frames_emitted(), 2);
        assert_eq!(stats.active_streams(), 0);
    }
}
