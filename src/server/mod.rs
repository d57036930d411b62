//! HTTP front end.
//!
//! Endpoints:
//! - `POST /api/download` - resolve a link and send the details to Telegram
//! - `GET /api/download?url=` - resolve a link only
//! - `POST /api/webhook` - Telegram bot updates
//! - `GET /health` - liveness

mod error;
mod handlers;
pub mod types;
mod webhook;

use crate::relay::RelayService;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::any::Any;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use error::AppError;
pub use webhook::{id_reply, BotCommand};

/// Shared, read-only handler state
#[derive(Clone)]
pub struct AppState {
    /// Resolution and delivery
    pub relay: RelayService,
    /// Bot handle used in user guidance
    pub bot_username: Option<String>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/download",
            post(handlers::create_download).get(handlers::lookup_download),
        )
        .route("/api/webhook", post(webhook::telegram_webhook))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(ToString::to_string))
        .unwrap_or_else(|| "unknown panic".to_string());
    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}

/// Serve the router on `listener` until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the server stops abnormally.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), anyhow::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!("Relay server listening on http://{addr}/");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Relay server error: {e}"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
