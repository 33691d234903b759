//! `AssetService` implementation over [`WatchlistService`].

use tonic::{Code, Request, Response, Status};

use super::proto::asset_service_server::AssetService;
use super::proto::{AssetPriceResponse, AssetRequest, Empty, SuccessResponse, WatchlistResponse};
use crate::application::services::{WatchlistError, WatchlistService};
use crate::domain::symbol::Symbol;

type RpcResult<T> = Result<Response<T>, Status>;

// =============================================================================
// Service
// =============================================================================

/// gRPC handlers for quote lookup and watchlist management.
#[derive(Debug, Clone)]
pub struct AssetGrpcService {
    watchlist: WatchlistService,
}

impl AssetGrpcService {
    /// Create a new service.
    #[must_use]
    pub const fn new(watchlist: WatchlistService) -> Self {
        Self { watchlist }
    }
}

#[tonic::async_trait]
impl AssetService for AssetGrpcService {
    async fn get_asset_price(&self, request: Request<AssetRequest>) -> RpcResult<AssetPriceResponse> {
        let snapshot = self
            .watchlist
            .asset_price(&request.into_inner().symbol)
            .await
            .map_err(status_from)?;

        Ok(Response::new(AssetPriceResponse {
            symbol: snapshot.symbol.into_inner(),
            price: snapshot.price,
        }))
    }

    async fn add_asset_to_watchlist(
        &self,
        request: Request<AssetRequest>,
    ) -> RpcResult<SuccessResponse> {
        let snapshot = self
            .watchlist
            .add_to_watchlist(&request.into_inner().symbol)
            .await
            .map_err(status_from)?;

        Ok(Response::new(SuccessResponse {
            message: format!("asset {} sent to queue", snapshot.symbol),
        }))
    }

    async fn get_watchlist(&self, _request: Request<Empty>) -> RpcResult<WatchlistResponse> {
        let symbols = self.watchlist.list_watchlist().await.map_err(status_from)?;

        Ok(Response::new(WatchlistResponse {
            symbols: symbols.into_iter().map(Symbol::into_inner).collect(),
        }))
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Map a use-case failure onto a gRPC status.
fn status_from(err: WatchlistError) -> Status {
    let status = match &err {
        WatchlistError::Validation(e) => Status::invalid_argument(e.to_string()),
        WatchlistError::NotFound(symbol) => Status::not_found(format!("symbol {symbol} not found")),
        WatchlistError::Upstream(e) => Status::unavailable(format!("failed to fetch quote: {e}")),
        WatchlistError::Publish(_) => Status::internal("failed to publish to queue"),
        WatchlistError::Storage(_) => Status::internal("failed to fetch watchlist"),
    };

    if matches!(status.code(), Code::Internal | Code::Unavailable) {
        tracing::error!(error = %err, code = ?status.code(), "RPC failed");
    }

    status
}
