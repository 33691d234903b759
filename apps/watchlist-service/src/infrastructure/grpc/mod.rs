//! gRPC Gateway
//!
//! Exposes the same use cases as the HTTP gateway through the
//! `watchlist.v1.AssetService` service:
//!
//! - `GetAssetPrice` - current price of a symbol
//! - `AddAssetToWatchlist` - validate, quote and enqueue
//! - `GetWatchlist` - stored symbols
//!
//! Status codes: invalid symbols are `INVALID_ARGUMENT`, unknown assets
//! `NOT_FOUND`, quote provider failures `UNAVAILABLE`, and publish or store
//! failures `INTERNAL`.

// Allow clippy warnings and missing docs in generated code
#[allow(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
pub mod proto;
mod server;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tonic::transport::server::TcpIncoming;

use crate::application::services::WatchlistService;
use crate::infrastructure::http::GatewayError;
use proto::asset_service_server::AssetServiceServer;

pub use server::AssetGrpcService;

/// gRPC gateway server.
#[derive(Debug)]
pub struct GrpcServer {
    port: u16,
    watchlist: WatchlistService,
    cancel: CancellationToken,
}

impl GrpcServer {
    /// Create a new gRPC server.
    #[must_use]
    pub const fn new(port: u16, watchlist: WatchlistService, cancel: CancellationToken) -> Self {
        Self {
            port,
            watchlist,
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
    /// Returns `GatewayError::ServerFailed` on a fatal transport error.
    pub async fn serve(self, listener: TcpListener) -> Result<(), GatewayError> {
        let local = listener
            .local_addr()
            .map_or_else(|_| self.port.to_string(), |addr| addr.to_string());
        tracing::info!(addr = %local, "gRPC gateway listening");

        Server::builder()
            .add_service(AssetServiceServer::new(AssetGrpcService::new(self.watchlist)))
            .serve_with_incoming_shutdown(
                TcpIncoming::from(listener),
                self.cancel.cancelled_owned(),
            )
            .await
            .map_err(|e| GatewayError::ServerFailed(e.to_string()))?;

        tracing::info!("gRPC gateway stopped");
        Ok(())
    }
}
