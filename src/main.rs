//! Gesture Stream - Main Entry Point
//!
//! Serves a mirrored, annotated camera feed over HTTP together with the most
//! recently recognized hand gesture.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use gesture_stream::api::{run_server, AppState};
use gesture_stream::camera::list_cameras;
use gesture_stream::config::AppConfig;
use gesture_stream::ml::load_detector;
use gesture_stream::telemetry::{init_logging, LogConfig};

#[derive(Parser, Debug)]
#[command(name = "gesture-stream", version, about = "Live hand gesture recognition over MJPEG")]
struct Cli {
    /// Path to a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Camera device index
    #[arg(long)]
    camera: Option<u32>,

    /// Output frame rate cap
    #[arg(long)]
    fps: Option<u32>,

    /// Hand landmark ONNX model
    #[arg(long)]
    model: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(camera) = self.camera {
            config.camera.index = camera;
        }
        if let Some(fps) = self.fps {
            config.pipeline.target_fps = fps;
        }
        if let Some(model) = &self.model {
            config.detector.model_path = model.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let mut config = AppConfig::resolve(cli.config.as_deref())?;
    cli.apply(&mut config);

    // Keep the guard alive for the program duration
    let _log_guard = match init_logging(&LogConfig::from(&config.logging)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    config.validate()?;
    tracing::info!("Gesture Stream v{}", env!("CARGO_PKG_VERSION"));

    let cameras = list_cameras();
    if cameras.is_empty() {
        tracing::warn!("No cameras found; /video_feed will fail until one is connected");
    }
    for camera in &cameras {
        tracing::info!("Camera {}: {}", camera.index, camera.name);
    }

    let detector = load_detector(&config.detector);

    let host: IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(host, config.server.port);
    let state = AppState::new(config, detector);

    run_server(addr, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await?;

    tracing::info!("Gesture Stream stopped");
    Ok(())
}
