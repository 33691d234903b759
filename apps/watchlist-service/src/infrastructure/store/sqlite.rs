//! SQLite watchlist store.
//!
//! Durable variant backed by a single `watchlist` table whose primary key is
//! the normalized symbol. Uniqueness is enforced by the database, so several
//! processes may share one database file safely.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::application::ports::{StorageError, WatchlistStore};
use crate::domain::symbol::Symbol;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS watchlist (symbol TEXT PRIMARY KEY NOT NULL)";

const INSERT_IGNORE: &str = "INSERT INTO watchlist (symbol) VALUES (?1) ON CONFLICT(symbol) DO NOTHING";

const SELECT_ALL: &str = "SELECT symbol FROM watchlist";

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Configuration(_) => Self::Connection(err.to_string()),
            _ => Self::Query(err.to_string()),
        }
    }
}

/// Connection pool settings for [`SqliteWatchlistStore`].
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Database URL (e.g. `sqlite://watchlist.db`).
    pub url: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
    /// Maximum lifetime of a pooled connection.
    pub max_lifetime: Duration,
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://watchlist.db".to_string(),
            max_connections: 10,
            max_lifetime: Duration::from_secs(3600),
        }
    }
}

/// SQLite implementation of `WatchlistStore`.
#[derive(Debug, Clone)]
pub struct SqliteWatchlistStore {
    pool: SqlitePool,
}

impl SqliteWatchlistStore {
    /// Open (creating if missing) the database and ensure the table exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the URL is invalid, the pool
    /// size is zero, or the database cannot be opened.
    pub async fn connect(config: &SqliteStoreConfig) -> Result<Self, StorageError> {
        if config.max_connections == 0 {
            return Err(StorageError::Connection(
                "max_connections must be at least 1".to_string(),
            ));
        }

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .max_lifetime(config.max_lifetime)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.ensure_schema().await?;

        info!(
            url = %config.url,
            max_connections = config.max_connections,
            "SQLite watchlist store ready"
        );
        Ok(store)
    }

    /// Open a private in-memory database.
    ///
    /// The pool holds exactly one connection that is never recycled, since an
    /// in-memory SQLite database lives only as long as its connection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if SQLite cannot be initialized.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Close the pool. Later operations fail with a connection error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl WatchlistStore for SqliteWatchlistStore {
    async fn add(&self, symbol: &Symbol) -> Result<bool, StorageError> {
        let result = sqlx::query(INSERT_IGNORE)
            .bind(symbol.as_str())
            .execute(&self.pool)
            .await?;

        let added = result.rows_affected() == 1;
        debug!(symbol = %symbol, added, "watchlist insert");
        Ok(added)
    }

    async fn get_all(&self) -> Result<Vec<Symbol>, StorageError> {
        let rows: Vec<String> = sqlx::query_scalar(SELECT_ALL)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|raw| {
                Symbol::parse(&raw)
                    .map_err(|e| StorageError::Integrity(format!("stored symbol {raw:?}: {e}")))
            })
            .collect()
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn sym(raw: &str) -> Symbol {
        Symbol::parse(raw).unwrap()
    }

    fn file_config(dir: &tempfile::TempDir, max_connections: u32) -> SqliteStoreConfig {
        SqliteStoreConfig {
            url: format!("sqlite://{}", dir.path().join("watchlist.db").display()),
            max_connections,
            ..SqliteStoreConfig::default()
        }
    }

    #[tokio::test]
    async fn zero_pool_size_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();

        let result = SqliteWatchlistStore::connect(&file_config(&dir, 0)).await;

        assert!(matches!(result, Err(StorageError::Connection(_))));
    }

    #[tokio::test]
    async fn add_twice_reports_once() {
        let store = SqliteWatchlistStore::in_memory().await.unwrap();

        assert!(store.add(&sym("AAPL")).await.unwrap());
        assert!(!store.add(&sym("AAPL")).await.unwrap());

        assert_eq!(store.get_all().await.unwrap(), vec![sym("AAPL")]);
    }

    #[tokio::test]
    async fn normalized_inputs_collapse() {
        let store = SqliteWatchlistStore::in_memory().await.unwrap();

        assert!(store.add(&sym("aapl")).await.unwrap());
        assert!(!store.add(&sym(" AAPL ")).await.unwrap());
        assert!(!store.add(&sym("Aapl")).await.unwrap());

        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = file_config(&dir, 2);

        {
            let store = SqliteWatchlistStore::connect(&config).await.unwrap();
            assert!(store.add(&sym("MSFT")).await.unwrap());
            store.close().await;
        }

        let reopened = SqliteWatchlistStore::connect(&config).await.unwrap();
        assert!(!reopened.add(&sym("msft")).await.unwrap());
        assert_eq!(reopened.get_all().await.unwrap(), vec![sym("MSFT")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_elect_single_winner() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            SqliteWatchlistStore::connect(&file_config(&dir, 4))
                .await
                .unwrap(),
        );
        let symbol = sym("AMZN");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let symbol = symbol.clone();
                tokio::spawn(async move { store.add(&symbol).await.unwrap() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(store.get_all().await.unwrap(), vec![symbol]);
    }

    #[tokio::test]
    async fn closed_pool_reports_storage_error() {
        let store = SqliteWatchlistStore::in_memory().await.unwrap();
        store.close().await;

        assert!(store.add(&sym("IBM")).await.is_err());
        assert!(store.ping().await.is_err());
    }

    #[tokio::test]
    async fn unreachable_database_is_connection_error() {
        let config = SqliteStoreConfig {
            url: "sqlite:///nonexistent-dir/missing/watchlist.db".to_string(),
            ..SqliteStoreConfig::default()
        };

        assert!(matches!(
            SqliteWatchlistStore::connect(&config).await,
            Err(StorageError::Connection(_))
        ));
    }
}
