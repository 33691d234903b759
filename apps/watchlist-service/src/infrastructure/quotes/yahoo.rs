//! HTTP client for the Yahoo Finance quote API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::application::ports::{QuoteSource, QuoteSourceError};
use crate::domain::quote::QuoteSnapshot;
use crate::domain::symbol::Symbol;

const QUOTE_PATH: &str = "/v6/finance/quote";

/// Connection settings for [`YahooQuoteClient`].
#[derive(Clone)]
pub struct QuoteClientConfig {
    /// API base URL, without trailing path.
    pub base_url: String,
    /// Key sent in the `X-API-KEY` header.
    pub api_key: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for QuoteClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<QuoteResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResult {
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    regular_market_day_high: Option<f64>,
    #[serde(default)]
    regular_market_day_low: Option<f64>,
}

// =============================================================================
// Client
// =============================================================================

/// Quote source backed by a Yahoo Finance compatible HTTP API.
#[derive(Debug, Clone)]
pub struct YahooQuoteClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl YahooQuoteClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `QuoteSourceError::Network` if the HTTP client cannot be built.
    pub fn new(config: &QuoteClientConfig) -> Result<Self, QuoteSourceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| QuoteSourceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl QuoteSource for YahooQuoteClient {
    #[tracing::instrument(skip(self), fields(symbol = %symbol))]
    async fn get_quote(&self, symbol: &Symbol) -> Result<Option<QuoteSnapshot>, QuoteSourceError> {
        let url = format!("{}{QUOTE_PATH}", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("symbols", symbol.as_str())])
            .header("X-API-KEY", &self.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| QuoteSourceError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| QuoteSourceError::Network(e.to_string()))?;

        // Anything but 200 is a provider error, including other 2xx codes.
        if status != StatusCode::OK {
            tracing::warn!(status = status.as_u16(), "Quote API returned error status");
            return Err(QuoteSourceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: QuoteEnvelope =
            serde_json::from_str(&body).map_err(|e| QuoteSourceError::Parse(e.to_string()))?;

        // The snapshot carries the requested symbol, not the provider's echo.
        let snapshot = envelope
            .quote_response
            .result
            .into_iter()
            .next()
            .map(|quote| {
                QuoteSnapshot::new(
                    symbol.clone(),
                    quote.regular_market_price.unwrap_or_default(),
                    quote.regular_market_day_high.unwrap_or_default(),
                    quote.regular_market_day_low.unwrap_or_default(),
                )
            });

        tracing::debug!(found = snapshot.is_some(), "Quote lookup complete");
        Ok(snapshot)
    }
}
