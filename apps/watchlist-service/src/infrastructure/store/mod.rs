//! Watchlist Store Adapters
//!
//! Two interchangeable implementations of the `WatchlistStore` port:
//!
//! - `InMemoryWatchlistStore`: process-local set behind a reader/writer lock
//! - `SqliteWatchlistStore`: durable table with a uniqueness constraint
//!
//! The variant is selected at startup from [`StoreSettings`].

mod memory;
mod sqlite;

use std::sync::Arc;

pub use memory::InMemoryWatchlistStore;
pub use sqlite::{SqliteStoreConfig, SqliteWatchlistStore};

use crate::application::ports::{StorageError, WatchlistStore};
use crate::infrastructure::config::{StoreBackend, StoreSettings};

/// Build the configured store.
///
/// # Errors
///
/// Returns `StorageError` if the durable store cannot be opened.
pub async fn open_store(settings: &StoreSettings) -> Result<Arc<dyn WatchlistStore>, StorageError> {
    match settings.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory watchlist store; contents are lost on restart");
            Ok(Arc::new(InMemoryWatchlistStore::new()))
        }
        StoreBackend::Sqlite => {
            let config = SqliteStoreConfig {
                url: settings.database_url.clone(),
                max_connections: settings.max_connections,
                max_lifetime: settings.conn_max_lifetime,
            };
            Ok(Arc::new(SqliteWatchlistStore::connect(&config).await?))
        }
    }
}
