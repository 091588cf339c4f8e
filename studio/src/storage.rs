//! Key-value storage port.
//!
//! Everything the editor persists (drafts, the project list, citations,
//! goals, hand-off flags) goes through [`StoragePort`]. The server uses the
//! SQLite-backed [`SqliteStorage`]; tests and ephemeral sessions use
//! [`MemoryStorage`].

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("storage encode error: {0}")]
    Encode(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

#[async_trait]
pub trait StoragePort: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub type SharedStorage = Arc<dyn StoragePort>;

/// Process-local storage. Cloning shares the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl StoragePort for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// SQLite-backed storage.
///
/// Schema (created on [`SqliteStorage::migrate`]):
/// ```sql
/// CREATE TABLE IF NOT EXISTS kv_store (
///     key        TEXT PRIMARY KEY,
///     value      BLOB NOT NULL,
///     updated_at TEXT NOT NULL
/// );
/// ```
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database behind a `sqlite:` url.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let file_path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        let pool = if file_path == ":memory:" {
            // A single connection, otherwise every pooled connection gets its own database.
            sqlx::sqlite::SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await?
        } else {
            let path = std::path::Path::new(file_path);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| StorageError::Backend(e.to_string()))?;
                }
            }
            SqlitePool::connect_with(
                sqlx::sqlite::SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true),
            )
            .await?
        };

        let storage = Self::new(pool);
        storage.migrate().await?;
        Ok(storage)
    }

    /// Create the kv table if it does not exist.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key        TEXT PRIMARY KEY,
                value      BLOB NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl StoragePort for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Read a JSON record, treating undecodable bytes as absent.
///
/// Storage failures still propagate; only decoding failures are swallowed
/// (with a warning), matching how saved browser state is treated.
pub async fn read_json<T: serde::de::DeserializeOwned>(
    storage: &dyn StoragePort,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(bytes) = storage.get(key).await? else {
        return Ok(None);
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding malformed stored record");
            Ok(None)
        }
    }
}

pub async fn write_json<T: serde::Serialize>(
    storage: &dyn StoragePort,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec(value).map_err(|e| StorageError::Encode(e.to_string()))?;
    storage.set(key, bytes).await
}
