//! API route definitions

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use super::shared::AppState;
use super::types::*;
use crate::camera::CaptureError;
use crate::pipeline::{FramePipeline, STREAM_CONTENT_TYPE};

/// Embedded dashboard HTML
const DASHBOARD_HTML: &str = include_str!("dashboard.html");

/// Encoded parts buffered between a pipeline thread and its client
const FRAME_BUFFER: usize = 2;

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Html(DASHBOARD_HTML) }))
        .route("/video_feed", get(video_feed))
        .route("/current_gesture", get(current_gesture))
        .route("/api/status", get(status_handler))
        .with_state(state)
}

async fn current_gesture(State(state): State<AppState>) -> Json<CurrentGestureResponse> {
    Json(state.current.snapshot().into())
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        active_streams: state.stats.active_streams(),
        frames_emitted: state.stats.frames_emitted(),
        measured_fps: state.stats.measured_fps(),
        target_fps: state.config.pipeline.target_fps,
    })
}

/// Start a pipeline for this client and stream its parts
///
/// The camera is opened on the pipeline thread before the response starts,
/// so an unavailable camera is reported as 503 rather than an empty stream.
/// The body ends when the server shuts down, which drops the receiver and
/// lets the pipeline thread release the camera.
async fn video_feed(State(state): State<AppState>) -> Response {
    if state.is_shutting_down() {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "Server is shutting down".to_string());
    }
    let shutdown = state.shutdown_signal();

    let (ready_tx, ready_rx) = oneshot::channel();
    let (frame_tx, frame_rx) = mpsc::channel::<Bytes>(FRAME_BUFFER);

    let spawned = std::thread::Builder::new()
        .name("gesture-pipeline".to_string())
        .spawn(move || run_stream(state, ready_tx, frame_tx));
    if let Err(e) = spawned {
        tracing::error!("Failed to start pipeline thread: {}", e);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }

    match ready_rx.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        Err(_) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Pipeline thread exited".to_string())
        }
    }

    let parts = futures_util::stream::unfold((frame_rx, shutdown), |(mut rx, mut shutdown)| async move {
        let part = tokio::select! {
            part = rx.recv() => part,
            _ = shutdown.wait_for(|stop| *stop) => {
                tracing::info!("Ending stream for shutdown");
                None
            }
        };
        part.map(|part| (Ok::<_, Infallible>(part), (rx, shutdown)))
    });

    (
        [
            (header::CONTENT_TYPE, STREAM_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(parts),
    )
        .into_response()
}

/// Body of one pipeline thread
///
/// Runs until the source ends or the client hangs up. Either way the
/// pipeline, and with it the camera, is dropped before the thread exits.
fn run_stream(
    state: AppState,
    ready: oneshot::Sender<Result<(), CaptureError>>,
    frames: mpsc::Sender<Bytes>,
) {
    let source = match (state.open_source)(&state.config.camera) {
        Ok(source) => source,
        Err(e) => {
            tracing::warn!("Stream rejected: {}", e);
            let _ = ready.send(Err(e));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        return;
    }

    tracing::info!("Stream started");
    let pipeline = FramePipeline::new(source, state.detector.clone(), state.current.clone(), &state.config)
        .with_stats(state.stats.clone());

    for part in pipeline {
        if frames.blocking_send(part.into_bytes()).is_err() {
            tracing::info!("Stream client disconnected");
            break;
        }
    }
    tracing::info!("Stream stopped");
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}
