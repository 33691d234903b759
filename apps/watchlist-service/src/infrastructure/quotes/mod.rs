//! Quote Source Adapters
//!
//! - `YahooQuoteClient`: Yahoo Finance compatible HTTP API
//! - `StaticQuoteSource`: fixed in-process quotes for local runs and tests

mod fixture;
mod yahoo;

use std::sync::Arc;

pub use fixture::StaticQuoteSource;
pub use yahoo::{QuoteClientConfig, YahooQuoteClient};

use crate::application::ports::{QuoteSource, QuoteSourceError};
use crate::infrastructure::config::{QuoteSettings, QuoteSourceKind};

/// Build the configured quote source.
///
/// # Errors
///
/// Returns `QuoteSourceError` if the HTTP client cannot be built.
pub fn build_quote_source(settings: &QuoteSettings) -> Result<Arc<dyn QuoteSource>, QuoteSourceError> {
    match settings.source {
        QuoteSourceKind::Yahoo => {
            let config = QuoteClientConfig {
                base_url: settings.base_url.clone(),
                api_key: settings.api_key.clone(),
                timeout: settings.timeout,
            };
            Ok(Arc::new(YahooQuoteClient::new(&config)?))
        }
        QuoteSourceKind::Static => {
            tracing::warn!("Using static quote source; prices are fixtures");
            Ok(Arc::new(StaticQuoteSource::with_sample_quotes()))
        }
    }
}
