//! Watchlist Service Binary
//!
//! Starts the HTTP and gRPC gateways and the ingestion consumer in one
//! process.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin watchlist-service
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `YAHOO_API_KEY`: quote API key (unless `QUOTE_SOURCE=static`)
//!
//! ## Optional
//! - `QUOTE_SOURCE`: yahoo | static (default: yahoo)
//! - `QUOTE_API_BASE_URL`: quote API base (default: <https://yfapi.net>)
//! - `QUOTE_API_TIMEOUT_SECS`: quote HTTP timeout (default: 30)
//! - `WATCHLIST_STORE`: sqlite | memory (default: sqlite)
//! - `DATABASE_URL`: SQLite URL (default: sqlite://watchlist.db)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
//! - `DATABASE_CONN_MAX_LIFETIME_SECS`: connection lifetime (default: 3600)
//! - `WATCHLIST_TOPIC`: broker topic (default: watchlist-topic)
//! - `CONSUMER_GROUP`: consumer group (default: persistence-group)
//! - `PUBLISH_TIMEOUT_MS`: producer deadline (default: 2000)
//! - `BROKER_TOPIC_CAPACITY`: retained unconsumed messages (default: 10000)
//! - `CONSUMER_RETRY_INITIAL_MS`: first pull-retry delay (default: 500)
//! - `CONSUMER_RETRY_MAX_SECS`: maximum pull-retry delay (default: 30)
//! - `HTTP_PORT`: HTTP gateway port (default: 8080)
//! - `GRPC_PORT`: gRPC gateway port (default: 50051)
//! - `OTEL_ENABLED`: export spans over OTLP (default: false)
//! - `RUST_LOG`: log filter (default: watchlist_service=info)
//!
//! A zero `DATABASE_MAX_CONNECTIONS` or `BROKER_TOPIC_CAPACITY` is rejected.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use watchlist_service::infrastructure::broker::{BrokerConfig, InMemoryBroker};
use watchlist_service::infrastructure::grpc::GrpcServer;
use watchlist_service::infrastructure::http::{AppState, GatewayError, GatewayServer};
use watchlist_service::infrastructure::quotes::build_quote_source;
use watchlist_service::infrastructure::store::open_store;
use watchlist_service::infrastructure::telemetry;
use watchlist_service::{
    IngestionConsumer, IngestionProducer, RetryConfig, ServiceConfig, WatchlistService,
    init_metrics,
};

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting watchlist service");

    let _metrics_handle = init_metrics();

    let config = ServiceConfig::from_env().context("invalid configuration")?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let store = open_store(&config.store)
        .await
        .context("failed to open watchlist store")?;

    let broker = Arc::new(InMemoryBroker::new(BrokerConfig {
        topic_capacity: config.broker.topic_capacity,
    }));

    let quotes = build_quote_source(&config.quotes).context("failed to build quote source")?;

    // A consumer that cannot subscribe is fatal.
    let consumer = IngestionConsumer::connect(
        broker.as_ref(),
        &config.broker.topic,
        &config.broker.consumer_group,
        Arc::clone(&store),
        RetryConfig::from(&config.consumer),
    )
    .await
    .context("failed to subscribe ingestion consumer")?;
    let consumer_stats = consumer.stats();
    let consumer_handle = tokio::spawn(consumer.run(shutdown_token.clone()));

    let producer = IngestionProducer::new(broker.clone(), config.broker.topic.clone())
        .with_deadline(config.broker.publish_timeout);
    let service = WatchlistService::new(quotes, store, producer);

    let grpc = GrpcServer::new(config.server.grpc_port, service.clone(), shutdown_token.clone());
    let grpc_listener = grpc.bind().await?;

    let state =
        AppState::new(service, env!("CARGO_PKG_VERSION")).with_consumer_stats(consumer_stats);
    let gateway = GatewayServer::new(config.server.http_port, state, shutdown_token.clone());
    let listener = gateway.bind().await?;

    let mut gateway_handle = tokio::spawn(gateway.serve(listener));
    let mut grpc_handle = tokio::spawn(grpc.serve(grpc_listener));

    tracing::info!("Watchlist service ready");

    tokio::select! {
        () = await_signal() => {}
        result = &mut gateway_handle => report_early_exit("HTTP", result),
        result = &mut grpc_handle => report_early_exit("gRPC", result),
    }

    shutdown_token.cancel();
    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );

    let drained = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        if !gateway_handle.is_finished() {
            let _ = gateway_handle.await;
        }
        if !grpc_handle.is_finished() {
            let _ = grpc_handle.await;
        }
        consumer_handle.await
    })
    .await;

    match drained {
        Ok(Ok(stats)) => tracing::info!(
            received = stats.received,
            added = stats.added,
            malformed = stats.malformed,
            storage_failures = stats.storage_failures,
            "Consumer drained"
        ),
        Ok(Err(e)) => tracing::error!(error = %e, "Consumer task panicked"),
        Err(_) => tracing::warn!("Shutdown timed out"),
    }

    broker.close();

    tracing::info!("Watchlist service stopped");
    Ok(())
}

/// Log a gateway task that stopped before shutdown was requested.
fn report_early_exit(
    gateway: &str,
    result: Result<Result<(), GatewayError>, tokio::task::JoinError>,
) {
    match result {
        Ok(Ok(())) => tracing::warn!(gateway, "Gateway exited unexpectedly"),
        Ok(Err(e)) => tracing::error!(gateway, error = %e, "Gateway failed"),
        Err(e) => tracing::error!(gateway, error = %e, "Gateway task panicked"),
    }
}

/// Log the parsed configuration.
fn log_config(config: &ServiceConfig) {
    tracing::info!(
        quote_source = config.quotes.source.as_str(),
        store = config.store.backend.as_str(),
        topic = %config.broker.topic,
        consumer_group = %config.broker.consumer_group,
        http_port = config.server.http_port,
        grpc_port = config.server.grpc_port,
        "Configuration loaded"
    );
    tracing::debug!(?config, "Full configuration");
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for SIGINT or SIGTERM.
async fn await_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
