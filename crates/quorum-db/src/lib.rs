pub mod memory;
pub mod polls;

pub use memory::MemoryPollStore;
pub use polls::SqlitePollStore;

use chrono::{DateTime, SecondsFormat, Utc};
use quorum_models::poll::Poll;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;
use thiserror::Error;

pub type DbPool = sqlx::SqlitePool;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("poll not found")]
    NotFound,
    #[error("poll {0} already exists")]
    AlreadyExists(String),
    #[error("version conflict on poll {id} (expected version {expected})")]
    Conflict { id: String, expected: i64 },
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store call timed out")]
    Timeout,
}

impl StoreError {
    /// Transport, encoding and timeout faults, as opposed to outcomes the
    /// caller is expected to handle (missing record, lost race).
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            StoreError::Sqlx(_) | StoreError::Serialization(_) | StoreError::Timeout
        )
    }
}

/// Keyed persistence for poll records.
///
/// `put` is a conditional write: it replaces the stored record only while the
/// stored `version` still equals `expected_version`, and otherwise fails with
/// [`StoreError::Conflict`] without touching the record.
#[allow(async_fn_in_trait)]
pub trait PollStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Poll, StoreError>;

    /// Persist a brand-new poll. Fails with `AlreadyExists` on id collision.
    async fn insert(&self, poll: &Poll) -> Result<(), StoreError>;

    async fn put(&self, poll: &Poll, expected_version: i64) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Polls posted in `channel_id`, newest first.
    async fn list_by_channel(&self, channel_id: &str) -> Result<Vec<Poll>, StoreError>;
}

/// Enum-dispatch wrapper so the configured backend can live in shared state.
#[derive(Clone)]
pub enum PollBackend {
    Sqlite(SqlitePollStore),
    Memory(MemoryPollStore),
}

impl PollBackend {
    pub fn name(&self) -> &'static str {
        match self {
            PollBackend::Sqlite(_) => "sqlite",
            PollBackend::Memory(_) => "memory",
        }
    }
}

impl PollStore for PollBackend {
    async fn get(&self, id: &str) -> Result<Poll, StoreError> {
        match self {
            PollBackend::Sqlite(s) => s.get(id).await,
            PollBackend::Memory(s) => s.get(id).await,
        }
    }

    async fn insert(&self, poll: &Poll) -> Result<(), StoreError> {
        match self {
            PollBackend::Sqlite(s) => s.insert(poll).await,
            PollBackend::Memory(s) => s.insert(poll).await,
        }
    }

    async fn put(&self, poll: &Poll, expected_version: i64) -> Result<(), StoreError> {
        match self {
            PollBackend::Sqlite(s) => s.put(poll, expected_version).await,
            PollBackend::Memory(s) => s.put(poll, expected_version).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        match self {
            PollBackend::Sqlite(s) => s.delete(id).await,
            PollBackend::Memory(s) => s.delete(id).await,
        }
    }

    async fn list_by_channel(&self, channel_id: &str) -> Result<Vec<Poll>, StoreError> {
        match self {
            PollBackend::Sqlite(s) => s.list_by_channel(channel_id).await,
            PollBackend::Memory(s) => s.list_by_channel(channel_id).await,
        }
    }
}

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("migrations: applied successfully");
    Ok(())
}

/// Fixed-width RFC 3339 so text ordering in SQL matches time ordering.
pub(crate) fn datetime_to_db_text(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn datetime_from_db_text(raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
