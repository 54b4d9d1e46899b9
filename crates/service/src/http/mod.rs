//! HTTP handlers and routers for the service.

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use rust_embed::RustEmbed;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

pub mod handlers;
pub mod health;
pub mod upload;

pub use handlers::not_found_handler;

use crate::ServiceState;

const STATUS_PREFIX: &str = "/_status";
const INDEX_PAGE: &str = "index.html";

#[derive(RustEmbed)]
#[folder = "static"]
struct StaticAssets;

async fn index_handler() -> Response {
    match StaticAssets::get(INDEX_PAGE) {
        Some(content) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            Body::from(content.data.into_owned()),
        )
            .into_response(),
        None => {
            tracing::error!("{} missing from embedded assets", INDEX_PAGE);
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}

/// Build the router: index page, upload endpoint and status routes
pub fn router(state: ServiceState) -> Router {
    let body_limit = state.limits().max_request_bytes;

    Router::new()
        .route("/", get(index_handler))
        .route(
            "/upload",
            post(upload::handler).fallback(handlers::method_not_allowed_handler),
        )
        .nest(STATUS_PREFIX, health::router(state.clone()))
        .fallback(handlers::not_found_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Serve the router on `listen_addr` until the shutdown signal fires
pub async fn run(
    listen_addr: SocketAddr,
    log_level: tracing::Level,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let router = router(state).layer(trace_layer);

    tracing::info!(addr = ?listen_addr, "HTTP server listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}
