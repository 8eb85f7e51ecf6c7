//! # HTTP Server
//!
//! Combines the endpoint routers over one shared `AppState`.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::config::HttpServerConfig;
use super::observability_routes::{health_routes, observability_routes};
use super::records_routes::records_routes;
use super::task_routes::task_routes;
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::store::OfflineStore;
use crate::submitter::{TaskOrchestrator, VoiceInterface};

/// Everything the handlers share
pub struct AppState {
    pub store: Arc<OfflineStore>,
    pub orchestrator: TaskOrchestrator,
    pub voice: VoiceInterface,
}

pub struct HttpServer {
    config: HttpServerConfig,
    store: Arc<OfflineStore>,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: Arc<AppState>) -> Self {
        let router = Self::build_router(&config, Arc::clone(&state));
        Self {
            config,
            store: Arc::clone(&state.store),
            router,
        }
    }

    fn build_router(config: &HttpServerConfig, state: Arc<AppState>) -> Router {
        let cors = if config.cors_origins.is_empty() {
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

        let metrics = Arc::clone(state.store.metrics());

        Router::new()
            .merge(health_routes())
            .nest("/observability", observability_routes(metrics))
            .nest("/records", records_routes(Arc::clone(&state)))
            .nest("/tasks", task_routes(state))
            .layer(cors)
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serves until ctrl-c, then syncs the store.
    pub async fn start(self) -> io::Result<()> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("{}", e)))?;

        let listener = TcpListener::bind(addr).await?;
        log_event_with_fields(Event::Serving, &[("addr", &addr.to_string())]);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        log_event(Event::ShutdownStart);
        self.store
            .sync()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        log_event(Event::ShutdownComplete);

        Ok(())
    }
}

async fn shutdown_signal() {
    // An unavailable signal handler means serving until the process is killed.
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
