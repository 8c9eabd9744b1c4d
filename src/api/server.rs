//! Axum server setup and startup

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use super::routes::create_router;
use super::shared::AppState;

/// Serve the API on `addr` until `shutdown` resolves
pub async fn run_server<F>(addr: SocketAddr, state: AppState, shutdown: F) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state, shutdown).await
}

/// Serve the API on an already bound listener
///
/// When `shutdown` resolves, open `/video_feed` bodies are ended so the
/// graceful shutdown can finish. Each pipeline thread then fails its next
/// send and releases its camera.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let streams = state.clone();
    let app = create_router(state).layer(cors);

    tracing::info!("Gesture stream listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Server shutting down gracefully");
            streams.begin_shutdown();
        })
        .await
}
