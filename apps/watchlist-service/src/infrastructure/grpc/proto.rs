//! `watchlist.v1` protobuf messages.
//!
//! Service stubs are generated by `build.rs` and included at the bottom of
//! this module.

/// Request naming a single asset.
#[derive(Clone, PartialEq, Eq, Hash, prost::Message)]
pub struct AssetRequest {
    /// Raw symbol as sent by the client.
    #[prost(string, tag = "1")]
    pub symbol: String,
}

/// Current price of an asset.
#[derive(Clone, PartialEq, prost::Message)]
pub struct AssetPriceResponse {
    /// Normalized symbol.
    #[prost(string, tag = "1")]
    pub symbol: String,
    /// Regular market price.
    #[prost(double, tag = "2")]
    pub price: f64,
}

/// Acknowledgement with a human-readable message.
#[derive(Clone, PartialEq, Eq, Hash, prost::Message)]
pub struct SuccessResponse {
    /// Message for the client.
    #[prost(string, tag = "1")]
    pub message: String,
}

/// Empty request.
#[derive(Clone, Copy, PartialEq, Eq, Hash, prost::Message)]
pub struct Empty {}

/// Stored watchlist symbols.
#[derive(Clone, PartialEq, Eq, Hash, prost::Message)]
pub struct WatchlistResponse {
    /// Symbols in ascending order.
    #[prost(string, repeated, tag = "1")]
    pub symbols: Vec<String>,
}

include!(concat!(env!("OUT_DIR"), "/watchlist.v1.AssetService.rs"));
