//! Mapping from use-case errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::application::services::WatchlistError;

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

/// Error returned from gateway handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<WatchlistError> for ApiError {
    fn from(err: WatchlistError) -> Self {
        let (status, message) = match &err {
            WatchlistError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            WatchlistError::NotFound(symbol) => (
                StatusCode::NOT_FOUND,
                format!("symbol {symbol} not found in external API"),
            ),
            WatchlistError::Upstream(_) => {
                (StatusCode::BAD_GATEWAY, "error fetching asset data".to_string())
            }
            WatchlistError::Publish(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "error queueing request".to_string(),
            ),
            WatchlistError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "unable to fetch watchlist".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %err, status = status.as_u16(), "Request failed");
        }

        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use test_case::test_case;

    use super::*;
    use crate::application::ports::{BrokerError, QuoteSourceError, StorageError};
    use crate::domain::symbol::{Symbol, SymbolError};

    #[test_case(WatchlistError::Validation(SymbolError::Empty), StatusCode::BAD_REQUEST ; "validation")]
    #[test_case(WatchlistError::NotFound(Symbol::parse("ZZZZ").unwrap()), StatusCode::NOT_FOUND ; "not found")]
    #[test_case(WatchlistError::Upstream(QuoteSourceError::Network("reset".into())), StatusCode::BAD_GATEWAY ; "upstream")]
    #[test_case(
        WatchlistError::Publish(BrokerError::Timeout { topic: "t".into(), after: Duration::from_secs(2) }),
        StatusCode::INTERNAL_SERVER_ERROR ;
        "publish"
    )]
    #[test_case(WatchlistError::Storage(StorageError::Query("x".into())), StatusCode::INTERNAL_SERVER_ERROR ; "storage")]
    fn maps_status(err: WatchlistError, expected: StatusCode) {
        assert_eq!(ApiError::from(err).status(), expected);
    }

    #[test]
    fn not_found_message_names_symbol() {
        let err = ApiError::from(WatchlistError::NotFound(Symbol::parse("zzzz").unwrap()));
        assert_eq!(err.message(), "symbol ZZZZ not found in external API");
    }

    #[test]
    fn upstream_details_are_not_leaked() {
        let err = ApiError::from(WatchlistError::Upstream(QuoteSourceError::Api {
            status: 401,
            body: "invalid api key abc123".to_string(),
        }));
        assert!(!err.message().contains("abc123"));
    }
}
