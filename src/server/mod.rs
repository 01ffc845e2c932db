// HTTP server for the generation gateway
//
// Routes:
// - POST /api/generate  (admission-gated image generation)
// - GET  /api/health    (configuration and ledger status)
// - GET  /metrics       (Prometheus scrape target)

pub mod handlers;
pub mod identity;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::generator::{ImageGenerator, ReplicateGenerator};
use crate::metrics;
use crate::rate_limit::{AdmissionControl, AdmissionGate, Clock, SystemClock};

// Room for the JSON envelope around the image data URL
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<dyn AdmissionControl>,
    pub generator: Arc<dyn ImageGenerator>,
    pub clock: Arc<dyn Clock>,
    pub max_image_bytes: usize,
}

impl AppState {
    pub fn new(
        gate: Arc<dyn AdmissionControl>,
        generator: Arc<dyn ImageGenerator>,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            gate,
            generator,
            clock: Arc::new(SystemClock),
            max_image_bytes,
        }
    }

    /// Replace the clock used for reset headers
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Build the router
pub fn router(state: AppState, metrics_enabled: bool) -> Router {
    let body_limit = state.max_image_bytes.saturating_add(BODY_OVERHEAD_BYTES);

    let mut app = Router::new()
        .route("/api/generate", post(handlers::generate))
        .route("/api/health", get(handlers::health));

    if metrics_enabled {
        app = app.route("/metrics", get(handlers::metrics_handler));
    }

    app.layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway and serve until Ctrl-C
pub async fn serve(config: Config) -> Result<()> {
    if config.metrics.enabled {
        metrics::init().context("Failed to initialize metrics")?;
    }

    let gate = Arc::new(AdmissionGate::new(config.rate_limit.clone()));
    let generator = Arc::new(
        ReplicateGenerator::new(&config.generator)
            .context("Failed to build image generator client")?,
    );
    if !generator.is_configured() {
        warn!("REPLICATE_API_TOKEN is not set; generation requests will fail");
    }

    let state = AppState::new(gate, generator, config.server.max_image_bytes);
    let app = router(state, config.metrics.enabled);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, config.server.port))?;

    info!(
        per_address_per_hour = config.rate_limit.per_address_per_hour,
        per_address_per_day = config.rate_limit.per_address_per_day,
        per_session_per_day = config.rate_limit.per_session_per_day,
        "Starting gateway on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind gateway server")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Gateway server error")?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
