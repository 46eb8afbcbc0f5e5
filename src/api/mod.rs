//! HTTP API server for the flora gateway

pub mod chat;
pub mod health;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::response::Html;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::pipeline::ConversationPipeline;

/// Built-in presentation page, used when no static dir is configured
const EMBEDDED_INDEX: &str = include_str!("../../static/index.html");

/// Shared state for API handlers
pub struct ApiState {
    /// The conversation pipeline; read-only after startup, shared
    /// across concurrent requests without locks
    pub pipeline: ConversationPipeline,
}

/// Assemble the gateway router
pub fn router(state: Arc<ApiState>, static_dir: Option<PathBuf>) -> Router {
    let mut router = Router::new().merge(health::router()).merge(chat::router(state));

    // Presentation page: a configured static dir wins over the embedded page
    router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.route("/", get(|| async { Html(EMBEDDED_INDEX) })),
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Bind and serve until interrupted
///
/// # Errors
///
/// Returns error if the port cannot be bound or the server fails
pub async fn serve(
    state: Arc<ApiState>,
    static_dir: Option<PathBuf>,
    port: u16,
) -> Result<()> {
    let app = router(state, static_dir);
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;

    tracing::info!(port, "flora gateway listening");
    axum::serve(listener, app).await?;

    Ok(())
}
