//! HTTP server for the docs site.
//!
//! Serves JSON endpoints consumed by the page and navigation components:
//!
//! | Route                                  | Response                         |
//! |----------------------------------------|----------------------------------|
//! | `GET /api/versions`                    | configured versions and default  |
//! | `GET /api/docs/{version}/tree`         | navigation tree, dropped pages   |
//! | `GET /api/docs/{version}/pages/{path}` | page meta, toc and HTML          |
//! | `POST /api/feedback`                   | `{"message": "ok" \| "fail"}`    |
//!
//! # Quick Start
//!
//! ```ignore
//! use docsite_config::Config;
//! use docsite_server::{Content, run_server, server_config_from_config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load(None, None).unwrap();
//!     let content = Content::from_config(&config).unwrap();
//!
//!     run_server(server_config_from_config(&config), content).await.unwrap();
//! }
//! ```

mod app;
mod content;
mod error;
mod feedback;
mod handlers;
mod middleware;
mod rate_limit;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use state::AppState;

pub use content::{Content, SetupError};
pub use feedback::{Feedback, FeedbackSink, LogFeedbackSink, Reaction};
pub use rate_limit::RateLimiter;

/// A documentation version as exposed by the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub id: String,
    pub label: String,
}

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Versions served, newest first.
    pub versions: Vec<VersionInfo>,
    pub default_version: Option<String>,
    /// Minimum interval between feedback submissions per client.
    pub feedback_window: Duration,
    /// Maximum number of clients tracked by the feedback rate limiter.
    pub feedback_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 3000,
            versions: Vec::new(),
            default_version: None,
            feedback_window: Duration::from_secs(1),
            feedback_capacity: 10_000,
        }
    }
}

/// Run the server until Ctrl-C, logging feedback with [`LogFeedbackSink`].
///
/// # Errors
///
/// Returns an error if the address is invalid or the server fails to start.
pub async fn run_server(
    config: ServerConfig,
    content: Content,
) -> Result<(), Box<dyn std::error::Error>> {
    run_server_with_sink(config, content, Arc::new(LogFeedbackSink)).await
}

/// Run the server until Ctrl-C with a custom feedback sink.
///
/// # Errors
///
/// Returns an error if the address is invalid or the server fails to start.
pub async fn run_server_with_sink(
    config: ServerConfig,
    content: Content,
    feedback: Arc<dyn FeedbackSink>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState {
        resolver: content.resolver,
        tree: content.tree,
        versions: config.versions,
        default_version: config.default_version,
        limiter: RateLimiter::new(config.feedback_window, config.feedback_capacity),
        feedback,
    });

    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from the site configuration.
#[must_use]
pub fn server_config_from_config(config: &docsite_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        versions: config
            .versions
            .iter()
            .map(|v| VersionInfo {
                id: v.id.clone(),
                label: v.label().to_owned(),
            })
            .collect(),
        default_version: config.default_version().map(str::to_owned),
        feedback_window: config.feedback.window(),
        feedback_capacity: config.feedback.capacity,
    }
}
