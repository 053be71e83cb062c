use axum::{
    error_handling::HandleErrorLayer,
    routing::{get, post},
    BoxError, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{AppConfig, ProductManager};

pub mod handlers;
pub mod middleware;
pub mod responses;

pub use handlers::{get_price_history, health_check, list_products, scrape_product, ScrapeRequest};
pub use responses::*;

#[derive(Clone)]
pub struct AppState {
    pub product_manager: Arc<ProductManager>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(product_manager: Arc<ProductManager>, config: AppConfig) -> Self {
        Self {
            product_manager,
            config: Arc::new(config),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout);

    Router::new()
        .route("/health", get(health_check))
        .route("/scrape", post(scrape_product))
        .route("/products", get(list_products))
        .route("/api/history/:asin", get(get_price_history))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn(middleware::request_logging))
                .layer(CompressionLayer::new())
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(request_timeout),
        )
        .with_state(state)
}

/// Timeouts and other middleware failures surface as the generic 500 body.
async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::error!("Request exceeded the server timeout");
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
    }
    ApiError::internal("Something went wrong")
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server is running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
