//! HTTP surface: input validation, status selection and serialization.

mod commands;
mod error;
mod quiz;
mod validation;

use crate::llm::GatewayError;
use crate::quiz::QuizService;
use crate::store::CommandStore;
use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use log::{info, warn};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use error::ApiError;

/// Maximum request body size: 64 KiB
pub const MAX_BODY_SIZE: usize = 64 * 1024;

pub struct AppState {
    pub quiz: QuizService,
    pub commands: Arc<dyn CommandStore>,
    pub quiz_tools: Vec<String>,
    /// When false, upstream failures are answered with 200 and the error
    /// text in place of the model output.
    pub llm_errors_as_status: bool,
}

type SharedState = Arc<AppState>;

impl AppState {
    fn llm_text(&self, outcome: Result<String, GatewayError>) -> Result<String, ApiError> {
        match outcome {
            Ok(text) => Ok(text),
            Err(err) if self.llm_errors_as_status => Err(ApiError::Upstream(err)),
            Err(err) => {
                info!("Answering with upstream failure text ({})", err.cause());
                Ok(err.to_string())
            }
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(commands::routes())
        .merge(quiz::routes())
        .route("/health", get(health))
        .with_state(Arc::new(state))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(middleware::from_fn(log_requests))
}

pub async fn run(state: AppState, addr: SocketAddr) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM where signals exist.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl-C received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}
