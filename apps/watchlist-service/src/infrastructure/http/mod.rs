//! HTTP Gateway
//!
//! Axum server exposing the watchlist API and operational endpoints.
//!
//! # Endpoints
//!
//! - `POST /api/assets/watchlist/{symbol}` - validate, quote and enqueue (202)
//! - `GET /api/assets/watchlist` - stored symbols
//! - `GET /api/assets/{symbol}` - current price
//! - `GET /health`, `/healthz`, `/readyz`, `/metrics`

mod controller;
mod error;
mod health;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use controller::{AcceptedResponse, AppState, PriceResponse, WatchlistResponse, create_router};
pub use error::{ApiError, ErrorBody};
pub use health::{HealthResponse, HealthStatus};

/// HTTP gateway server.
#[derive(Debug)]
pub struct GatewayServer {
    port: u16,
    state: AppState,
    cancel: CancellationToken,
}

impl GatewayServer {
    /// Create a new gateway server.
    #[must_use]
    pub const fn new(port: u16, state: AppState, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::BindFailed` if the port is unavailable.
    pub async fn bind(&self) -> Result<TcpListener, GatewayError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::BindFailed(self.port, e.to_string()))
    }

    /// Serve on an already bound listener until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::ServerFailed` on a fatal server error.
    pub async fn serve(self, listener: TcpListener) -> Result<(), GatewayError> {
        let app = create_router(self.state);

        let local = listener
            .local_addr()
            .map_or_else(|_| self.port.to_string(), |addr| addr.to_string());
        tracing::info!(addr = %local, "HTTP gateway listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| GatewayError::ServerFailed(e.to_string()))?;

        tracing::info!("HTTP gateway stopped");
        Ok(())
    }
}

/// Gateway server errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}
