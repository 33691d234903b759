//! Quote Snapshot
//!
//! Point-in-time price data captured when a symbol is requested. The snapshot
//! is the broker payload: it is encoded as JSON with the upstream provider's
//! field names so that messages stay self-describing on the topic.

use serde::{Deserialize, Serialize};

use super::symbol::Symbol;

/// Immutable price snapshot for a single symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    /// Normalized symbol.
    pub symbol: Symbol,
    /// Last regular-market price.
    #[serde(rename = "regularMarketPrice", default)]
    pub price: f64,
    /// Regular-market day high.
    #[serde(rename = "regularMarketDayHigh", default)]
    pub day_high: f64,
    /// Regular-market day low.
    #[serde(rename = "regularMarketDayLow", default)]
    pub day_low: f64,
}

impl QuoteSnapshot {
    /// Create a new snapshot.
    #[must_use]
    pub const fn new(symbol: Symbol, price: f64, day_high: f64, day_low: f64) -> Self {
        Self {
            symbol,
            price,
            day_high,
            day_low,
        }
    }

    /// Encode the snapshot as a broker payload.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (non-finite floats are written
    /// as `null` by `serde_json`, so in practice this does not fail).
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode a broker payload.
    ///
    /// The symbol inside the payload is normalized on the way in.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the payload is not a JSON quote object or
    /// its symbol is invalid.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        if payload.is_empty() {
            return Err(DecodeError::Empty);
        }
        serde_json::from_slice(payload).map_err(|e| DecodeError::Malformed(e.to_string()))
    }
}

/// Broker payload could not be turned into a [`QuoteSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Zero-length payload.
    #[error("empty payload")]
    Empty,

    /// Not a quote object (legacy plain-text payloads land here too).
    #[error("malformed payload: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(symbol: &str, price: f64, day_high: f64, day_low: f64) -> QuoteSnapshot {
        QuoteSnapshot::new(Symbol::parse(symbol).unwrap(), price, day_high, day_low)
    }

    #[test]
    fn encodes_with_provider_field_names() {
        let payload = snapshot("TSLA", 250.12, 255.5, 245.25).encode().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(json["symbol"], "TSLA");
        assert_eq!(json["regularMarketPrice"], 250.12);
        assert_eq!(json["regularMarketDayHigh"], 255.5);
        assert_eq!(json["regularMarketDayLow"], 245.25);
    }

    #[test]
    fn decode_normalizes_symbol() {
        let payload = br#"{"symbol":" msft ","regularMarketPrice":410.5}"#;
        let decoded = QuoteSnapshot::decode(payload).unwrap();

        assert_eq!(decoded.symbol.as_str(), "MSFT");
        assert!((decoded.price - 410.5).abs() < f64::EPSILON);
        assert!(decoded.day_high.abs() < f64::EPSILON);
    }

    #[test]
    fn decode_rejects_plain_text() {
        assert!(matches!(
            QuoteSnapshot::decode(b"AAPL"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn decode_rejects_empty_payload() {
        assert_eq!(QuoteSnapshot::decode(b""), Err(DecodeError::Empty));
    }

    #[test]
    fn decode_rejects_blank_symbol() {
        let payload = br#"{"symbol":"   ","regularMarketPrice":1.0}"#;
        assert!(matches!(
            QuoteSnapshot::decode(payload),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn decode_rejects_missing_symbol() {
        let payload = br#"{"regularMarketPrice":1.0}"#;
        assert!(QuoteSnapshot::decode(payload).is_err());
    }
}
