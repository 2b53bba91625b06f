//! Covquest · Coverage Challenge Backend
//!
//! - Turns JaCoCo coverage reports into challenges ("cover this line", "keep the build green")
//! - Axum HTTP API a CI host calls after every finished build
//! - XML export of all tracked challenges
//!
//! Important env variables:
//!   PORT                 : u16 (default 3000)
//!   COVQUEST_CONFIG_PATH : path to TOML config (project, report layout, RNG seed)
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use covquest_backend::routes::build_router;
use covquest_backend::state::AppState;
use covquest_backend::telemetry;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state (tracked challenges, report accessor, config).
  let state = Arc::new(AppState::new());

  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "covquest", %addr, project = %state.config.project.name, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "covquest", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "covquest", "Shutdown signal received");
}
