//! # HTTP Server
//!
//! Main HTTP server combining all endpoint routers under `/api/v1`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Uri;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::admin_routes::admin_routes;
use super::auth_routes::auth_routes;
use super::bootcamp_routes::bootcamp_routes;
use super::config::HttpServerConfig;
use super::course_routes::course_routes;
use super::general_routes::general_routes;
use super::observability_routes::health_routes;
use super::response::Rejection;
use super::review_routes::review_routes;
use super::state::AppState;

/// Headroom over the upload limit for multipart framing and other fields
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// HTTP server for the bootcamp API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server over `state`
    pub fn new(config: HttpServerConfig, state: Arc<AppState>) -> Self {
        let router = build_router(&config, state);
        Self { config, router }
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until ctrl-c
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("Invalid socket address: {}", e)))?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "bootcamp API listening");
        info!("health check: http://{}/health", addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("server stopped");
        Ok(())
    }
}

/// Build the combined router with all endpoints
pub fn build_router(config: &HttpServerConfig, state: Arc<AppState>) -> Router {
    let cors = if config.cors_origins.is_empty() {
        // No origins configured: permissive, for development
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api = Router::new()
        .nest("/bootcamps", bootcamp_routes())
        .nest("/courses", course_routes())
        .nest("/reviews", review_routes())
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
        .nest("/general", general_routes());

    Router::new()
        .merge(health_routes())
        .nest("/api/v1", api)
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes + BODY_LIMIT_SLACK))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn not_found(uri: Uri) -> Rejection {
    Rejection::new(404, format!("Route {} not found", uri.path()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c, shutting down");
        return;
    }
    info!("shutdown requested");
}
