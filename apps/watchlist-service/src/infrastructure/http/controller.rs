//! HTTP Controller (Driver Adapter)
//!
//! Axum routes that delegate to [`WatchlistService`].

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::health;
use crate::application::services::{ConsumerStats, WatchlistService};
use crate::domain::quote::QuoteSnapshot;
use crate::domain::symbol::Symbol;

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Watchlist use cases.
    pub watchlist: WatchlistService,
    /// Live consumer counters, when a consumer runs in this process.
    pub consumer_stats: Option<Arc<ConsumerStats>>,
    /// Service version.
    pub version: String,
    /// Process start, for uptime.
    pub started_at: Instant,
}

impl AppState {
    /// Create state for the given service.
    #[must_use]
    pub fn new(watchlist: WatchlistService, version: impl Into<String>) -> Self {
        Self {
            watchlist,
            consumer_stats: None,
            version: version.into(),
            started_at: Instant::now(),
        }
    }

    /// Report the given consumer's counters on `/health`.
    #[must_use]
    pub fn with_consumer_stats(mut self, stats: Arc<ConsumerStats>) -> Self {
        self.consumer_stats = Some(stats);
        self
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Response to an accepted add request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptedResponse {
    /// Confirmation that the asset was queued.
    pub message: String,
}

/// Watchlist contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistResponse {
    /// Stored symbols, sorted.
    pub symbols: Vec<Symbol>,
}

/// Current price of one asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    /// Normalized symbol.
    pub symbol: Symbol,
    /// Last regular-market price.
    pub price: f64,
    /// Regular-market day high.
    pub day_high: f64,
    /// Regular-market day low.
    pub day_low: f64,
}

impl From<QuoteSnapshot> for PriceResponse {
    fn from(quote: QuoteSnapshot) -> Self {
        Self {
            symbol: quote.symbol,
            price: quote.price,
            day_high: quote.day_high,
            day_low: quote.day_low,
        }
    }
}

// =============================================================================
// Router
// =============================================================================

/// Create the HTTP router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/assets/watchlist", get(list_watchlist))
        .route("/api/assets/watchlist/{symbol}", post(add_to_watchlist))
        .route("/api/assets/{symbol}", get(asset_price))
        .route("/health", get(health::health_handler))
        .route("/healthz", get(health::liveness_handler))
        .route("/readyz", get(health::readiness_handler))
        .route("/metrics", get(health::metrics_handler))
        .with_state(state)
}

async fn add_to_watchlist(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    let snapshot = state.watchlist.add_to_watchlist(&symbol).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            message: format!(
                "Asset {} (Price: {:.2}) sent to queue",
                snapshot.symbol, snapshot.price
            ),
        }),
    ))
}

async fn list_watchlist(
    State(state): State<AppState>,
) -> Result<Json<WatchlistResponse>, ApiError> {
    let symbols = state.watchlist.list_watchlist().await?;
    Ok(Json(WatchlistResponse { symbols }))
}

async fn asset_price(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<PriceResponse>, ApiError> {
    let quote = state.watchlist.asset_price(&symbol).await?;
    Ok(Json(quote.into()))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::application::ports::WatchlistStore;
    use crate::application::services::IngestionProducer;
    use crate::infrastructure::broker::InMemoryBroker;
    use crate::infrastructure::http::error::ErrorBody;
    use crate::infrastructure::quotes::StaticQuoteSource;
    use crate::infrastructure::store::InMemoryWatchlistStore;

    const TOPIC: &str = "watchlist-topic";

    struct Fixture {
        quotes: Arc<StaticQuoteSource>,
        store: Arc<InMemoryWatchlistStore>,
        broker: Arc<InMemoryBroker>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                quotes: Arc::new(StaticQuoteSource::with_sample_quotes()),
                store: Arc::new(InMemoryWatchlistStore::new()),
                broker: Arc::new(InMemoryBroker::with_defaults()),
            }
        }

        fn router(&self) -> Router {
            let service = WatchlistService::new(
                self.quotes.clone(),
                self.store.clone(),
                IngestionProducer::new(self.broker.clone(), TOPIC),
            );
            create_router(AppState::new(service, "0.0.0-test"))
        }

        fn published(&self) -> u64 {
            self.broker.stats(TOPIC).map_or(0, |s| s.published)
        }
    }

    async fn send(router: Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn add_returns_accepted_with_price() {
        let fixture = Fixture::new();

        let (status, body) = send(fixture.router(), "POST", "/api/assets/watchlist/tsla").await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["message"], "Asset TSLA (Price: 250.12) sent to queue");
        assert_eq!(fixture.published(), 1);
    }

    #[tokio::test]
    async fn add_blank_symbol_is_bad_request() {
        let fixture = Fixture::new();

        let (status, body) = send(fixture.router(), "POST", "/api/assets/watchlist/%20").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: ErrorBody = serde_json::from_value(body).unwrap();
        assert_eq!(body.error, "symbol is required");
        assert_eq!(fixture.published(), 0);
    }

    #[tokio::test]
    async fn add_unknown_symbol_is_not_found() {
        let fixture = Fixture::new();

        let (status, body) = send(fixture.router(), "POST", "/api/assets/watchlist/ZZZZ").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "symbol ZZZZ not found in external API");
        assert_eq!(fixture.published(), 0);
        assert!(fixture.store.is_empty());
    }

    #[tokio::test]
    async fn add_during_quote_outage_is_bad_gateway() {
        let fixture = Fixture::new();
        fixture.quotes.set_unavailable(Some("maintenance"));

        let (status, body) = send(fixture.router(), "POST", "/api/assets/watchlist/AAPL").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "error fetching asset data");
    }

    #[tokio::test]
    async fn add_with_closed_broker_is_server_error() {
        let fixture = Fixture::new();
        fixture.broker.close();

        let (status, body) = send(fixture.router(), "POST", "/api/assets/watchlist/AAPL").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "error queueing request");
    }

    #[tokio::test]
    async fn list_returns_sorted_symbols() {
        let fixture = Fixture::new();
        for raw in ["TSLA", "AAPL"] {
            fixture.store.add(&Symbol::parse(raw).unwrap()).await.unwrap();
        }

        let (status, body) = send(fixture.router(), "GET", "/api/assets/watchlist").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "symbols": ["AAPL", "TSLA"] }));
    }

    #[tokio::test]
    async fn list_empty_watchlist() {
        let fixture = Fixture::new();

        let (status, body) = send(fixture.router(), "GET", "/api/assets/watchlist").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "symbols": [] }));
    }

    #[tokio::test]
    async fn price_lookup_returns_quote() {
        let fixture = Fixture::new();

        let (status, body) = send(fixture.router(), "GET", "/api/assets/tsla").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({
                "symbol": "TSLA",
                "price": 250.12,
                "dayHigh": 255.5,
                "dayLow": 245.25
            })
        );
        assert_eq!(fixture.published(), 0);
    }

    #[tokio::test]
    async fn price_lookup_invalid_symbol() {
        let fixture = Fixture::new();

        let (status, _) = send(fixture.router(), "GET", "/api/assets/BAD$SYM").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
