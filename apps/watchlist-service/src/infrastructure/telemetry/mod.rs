//! Logging and Span Export
//!
//! Installs the global `tracing` subscriber. Console logging is always on;
//! spans are additionally shipped to an OTLP collector when `OTEL_ENABLED`
//! is set.
//!
//! # Environment Variables
//!
//! - `OTEL_ENABLED`: `true`, `1` or `yes` to export spans (default: off)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: collector endpoint (default: http://localhost:4317)
//! - `OTEL_SERVICE_NAME`: `service.name` resource attribute (default: watchlist-service)
//! - `RUST_LOG`: log filter (default: [`DEFAULT_LOG_FILTER`])
//!
//! ```ignore
//! // Hold the guard until shutdown; dropping it flushes pending spans.
//! let _telemetry = watchlist_service::infrastructure::telemetry::init();
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Log filter used when `RUST_LOG` is unset or does not parse.
pub const DEFAULT_LOG_FILTER: &str = "watchlist_service=info,sqlx=warn,hyper=warn,h2=warn,tonic=info";

/// Telemetry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Export spans over OTLP.
    pub export_spans: bool,
    /// Collector endpoint.
    pub otlp_endpoint: String,
    /// Reported service name.
    pub service_name: String,
    /// `RUST_LOG`-style filter directives.
    pub log_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            export_spans: false,
            otlp_endpoint: "http://localhost:4317".to_string(),
            service_name: "watchlist-service".to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings from an arbitrary key lookup. Unset or blank keys keep
    /// their defaults.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            export_spans: set("OTEL_ENABLED").is_some_and(|v| is_truthy(&v)),
            otlp_endpoint: set("OTEL_EXPORTER_OTLP_ENDPOINT").unwrap_or(defaults.otlp_endpoint),
            service_name: set("OTEL_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_filter: set("RUST_LOG").unwrap_or(defaults.log_filter),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_filter).unwrap_or_else(|e| {
            eprintln!("Ignoring invalid log filter {:?}: {e}", self.log_filter);
            EnvFilter::new(DEFAULT_LOG_FILTER)
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

/// Keeps the span exporter alive; flushes and stops it on drop.
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are being exported.
    #[must_use]
    pub const fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        let Some(provider) = self.provider.take() else {
            return;
        };
        if let Err(e) = provider.shutdown() {
            eprintln!("Span exporter did not shut down cleanly: {e}");
        }
    }
}

/// Install the subscriber using [`TelemetryConfig::from_env`].
#[must_use]
pub fn init() -> TelemetryGuard {
    init_with_config(&TelemetryConfig::from_env())
}

/// Install the subscriber.
///
/// An exporter that cannot be built is reported on stderr and skipped, so
/// console logging always comes up.
#[must_use]
pub fn init_with_config(config: &TelemetryConfig) -> TelemetryGuard {
    let provider = if config.export_spans {
        span_provider(config)
    } else {
        None
    };

    let otel_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()))
    });

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    if let Err(e) = tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
    {
        eprintln!("Global subscriber already installed: {e}");
    }

    TelemetryGuard { provider }
}

fn span_provider(config: &TelemetryConfig) -> Option<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.otlp_endpoint)
        .build()
        .map_err(|e| eprintln!("OTLP exporter unavailable, spans will not be exported: {e}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .build();

    Some(
        SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(resource)
            .build(),
    )
}
