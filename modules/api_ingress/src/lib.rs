//! HTTP host: wraps the module routers with the shared middleware stack,
//! exposes health and API documentation, and runs the serve loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    http::header,
    middleware::from_fn,
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod error;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

/// Owns the HTTP server for the application routers.
#[derive(Debug, Clone, Default)]
pub struct ApiIngress {
    config: ApiIngressConfig,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Merge the application router with host routes and wrap everything in
    /// the middleware stack.
    pub fn build_router(&self, app: Router, openapi: Option<utoipa::openapi::OpenApi>) -> Router {
        let mut router = Router::new()
            .route("/health", get(web::health_check))
            .merge(app)
            .fallback(error::not_found);

        if self.config.enable_docs {
            if let Some(doc) = openapi {
                let doc = Arc::new(doc);
                router = router
                    .route(
                        "/openapi.json",
                        get(move || {
                            let doc = doc.clone();
                            async move {
                                (
                                    [(header::CACHE_CONTROL, "no-store")],
                                    axum::Json((*doc).clone()),
                                )
                                    .into_response()
                            }
                        }),
                    )
                    .route("/docs", get(web::serve_docs));
            }
        }

        // Layers wrap from the bottom up; request flow (outermost first):
        // SetRequestId -> PropagateRequestId -> Trace -> push_req_id -> Timeout -> CORS -> BodyLimit
        let x_request_id = request_id::header();

        router = router.layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));

        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        router = router
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.request_timeout_secs,
            )))
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(request_id::create_trace_layer())
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

        router
    }

    /// Resolve the listen address: explicit `bind_addr` wins over the server section.
    pub fn bind_addr(&self, host: &str, port: u16) -> Result<SocketAddr> {
        let raw = self
            .config
            .bind_addr
            .clone()
            .unwrap_or_else(|| format!("{host}:{port}"));
        raw.parse()
            .with_context(|| format!("Invalid bind address '{raw}'"))
    }

    /// Bind and serve until `cancel` fires, then drain in-flight requests.
    pub async fn serve(
        &self,
        addr: SocketAddr,
        router: Router,
        cancel: CancellationToken,
    ) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        tracing::info!("HTTP server bound on {}", addr);

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")
    }
}
