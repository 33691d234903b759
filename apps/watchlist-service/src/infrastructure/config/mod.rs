//! Configuration Module
//!
//! Configuration loading for the watchlist service.

mod settings;

pub use settings::{
    BrokerSettings, ConfigError, ConsumerSettings, QuoteSettings, QuoteSourceKind, ServerSettings,
    ServiceConfig, StoreBackend, StoreSettings,
};
