//! Quote Source Port (Driven Port)
//!
//! Upstream point-in-time quote lookup used to validate symbols before they
//! are enqueued.

use async_trait::async_trait;

use crate::domain::quote::QuoteSnapshot;
use crate::domain::symbol::Symbol;

/// Quote source error. "Not found" is not an error; see [`QuoteSource::get_quote`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuoteSourceError {
    /// Request could not be sent or the response could not be read.
    #[error("quote request failed: {0}")]
    Network(String),

    /// Upstream answered with a non-success status.
    #[error("quote API error: status {status}, body: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// Response body was not the expected shape.
    #[error("failed to parse quote response: {0}")]
    Parse(String),

    /// Source is deliberately offline.
    #[error("quote source unavailable: {0}")]
    Unavailable(String),
}

/// Port for fetching quotes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch the current quote for `symbol`.
    ///
    /// Returns `Ok(None)` if the upstream has no such instrument.
    async fn get_quote(&self, symbol: &Symbol) -> Result<Option<QuoteSnapshot>, QuoteSourceError>;
}
