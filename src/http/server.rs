//! HTTP server assembly.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::admission::{Clock, SlidingWindowLimiter};
use crate::auth::SessionManager;
use crate::error::{DoormanError, Result};

use super::{admission, auth};

/// Shared state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<SlidingWindowLimiter>,
    pub sessions: Arc<SessionManager>,
    pub clock: Arc<dyn Clock>,
}

/// HTTP server for the admission and identity service.
pub struct HttpServer {
    /// Address to bind to
    addr: SocketAddr,
    state: AppState,
}

impl HttpServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self { addr, state }
    }

    /// Assemble the full router, admission middleware included.
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/", get(root))
            .route("/health", get(health))
            .route("/api/v1/auth/login", post(auth::login))
            .route("/api/v1/auth/refresh", post(auth::refresh))
            .route("/api/v1/auth/me", get(auth::me))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                admission::admit,
            ))
            .with_state(state)
    }

    /// Start the HTTP server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = Self::router(self.state);

        info!(
            addr = %self.addr,
            "Starting HTTP server with graceful shutdown"
        );

        let listener = tokio::net::TcpListener::bind(self.addr).await?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await
        .map_err(|e| {
            error!(error = %e, "HTTP server failed");
            DoormanError::Io(e)
        })
    }
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
