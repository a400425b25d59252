//! DraftForge API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Keyword research endpoints
//! - Draft lifecycle endpoints (create, read, outline, approve, export)
//! - Rate limiting
//! - Observability (logging, metrics, tracing)
//!
//! The gateway never runs pipeline stages itself: creating or approving a
//! draft only enqueues the corresponding stage job.

mod handlers;
mod middleware;

use axum::{
    routing::{get, post, put},
    Router,
};
use draftforge_common::{
    config::AppConfig,
    db::{DbPool, Repository},
    drafts::DraftService,
    metrics,
    queue::StageQueues,
    research::ResearchClient,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, Level};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub drafts: DraftService,
    pub research: Arc<ResearchClient>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .json()
        .init();

    info!("Starting DraftForge API Gateway v{}", draftforge_common::VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    let config = Arc::new(config);

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port > 0 {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], config.observability.metrics_port))
            .install()?;
    }

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    // Initialize stage queues and clients
    let queues = StageQueues::from_config(&config).await?;
    let drafts = DraftService::new(Repository::new(db.clone()), queues);
    let research = Arc::new(ResearchClient::new(&config.research)?);

    // Create app state
    let state = AppState {
        config: config.clone(),
        db,
        drafts,
        research,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Keyword endpoints
        .route("/keywords/suggest", post(handlers::keywords::suggest_keywords))
        .route("/keywords/{id}", get(handlers::keywords::get_keyword))
        // Draft endpoints
        .route("/drafts", post(handlers::drafts::create_draft))
        .route("/drafts", get(handlers::drafts::list_drafts))
        .route("/drafts/{id}", get(handlers::drafts::get_draft))
        .route("/drafts/{id}/outline", put(handlers::drafts::update_outline))
        .route(
            "/drafts/{id}/approve-outline",
            put(handlers::drafts::approve_outline),
        )
        .route("/drafts/{id}/export", get(handlers::drafts::export_draft));

    // Rate limiting applies to the API surface only, not the probes
    let api_routes = match middleware::rate_limit::RateGate::from_config(&state.config.rate_limit)
    {
        Some(gate) => api_routes.layer(axum::middleware::from_fn(
            move |request: axum::extract::Request, next: axum::middleware::Next| {
                let gate = gate.clone();
                async move { middleware::rate_limit::enforce(gate, request, next).await }
            },
        )),
        None => api_routes,
    };

    // Compose the app
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
