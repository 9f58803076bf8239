use crate::{datetime_from_db_text, datetime_to_db_text, DbPool, PollStore, StoreError};
use quorum_models::poll::Poll;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::BTreeMap;

const POLL_COLUMNS: &str = "id, creator_id, channel_id, question, options, created_at, \
                            closed_at, is_open, tally, version";

/// Row wrapper so decoding of the JSON and timestamp columns happens inside sqlx.
struct PollRow(Poll);

impl<'r> sqlx::FromRow<'r, SqliteRow> for PollRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let options_raw: String = row.try_get("options")?;
        let tally_raw: String = row.try_get("tally")?;
        let created_at_raw: String = row.try_get("created_at")?;
        let closed_at_raw: Option<String> = row.try_get("closed_at")?;

        let options: Vec<String> =
            serde_json::from_str(&options_raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let tally: BTreeMap<usize, u64> =
            serde_json::from_str(&tally_raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Self(Poll {
            id: row.try_get("id")?,
            creator_id: row.try_get("creator_id")?,
            channel_id: row.try_get("channel_id")?,
            question: row.try_get("question")?,
            options,
            created_at: datetime_from_db_text(&created_at_raw)?,
            closed_at: closed_at_raw
                .as_deref()
                .map(datetime_from_db_text)
                .transpose()?,
            is_open: row.try_get("is_open")?,
            tally,
            version: row.try_get("version")?,
        }))
    }
}

/// SQLite-backed poll store. One row per poll; options and tally are JSON text.
#[derive(Clone)]
pub struct SqlitePollStore {
    pool: DbPool,
}

impl SqlitePollStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn stored_version(&self, id: &str) -> Result<Option<i64>, StoreError> {
        let version = sqlx::query_scalar::<_, i64>("SELECT version FROM polls WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(version)
    }
}

impl PollStore for SqlitePollStore {
    async fn get(&self, id: &str) -> Result<Poll, StoreError> {
        let row = sqlx::query_as::<_, PollRow>(&format!(
            "SELECT {POLL_COLUMNS} FROM polls WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| r.0).ok_or(StoreError::NotFound)
    }

    async fn insert(&self, poll: &Poll) -> Result<(), StoreError> {
        let options = serde_json::to_string(&poll.options)?;
        let tally = serde_json::to_string(&poll.tally)?;

        let result = sqlx::query(&format!(
            "INSERT INTO polls ({POLL_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ))
        .bind(&poll.id)
        .bind(&poll.creator_id)
        .bind(&poll.channel_id)
        .bind(&poll.question)
        .bind(options)
        .bind(datetime_to_db_text(poll.created_at))
        .bind(poll.closed_at.map(datetime_to_db_text))
        .bind(poll.is_open)
        .bind(tally)
        .bind(poll.version)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::AlreadyExists(poll.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, poll: &Poll, expected_version: i64) -> Result<(), StoreError> {
        let options = serde_json::to_string(&poll.options)?;
        let tally = serde_json::to_string(&poll.tally)?;

        let result = sqlx::query(
            "UPDATE polls
             SET creator_id = ?3, channel_id = ?4, question = ?5, options = ?6,
                 created_at = ?7, closed_at = ?8, is_open = ?9, tally = ?10, version = ?11
             WHERE id = ?1 AND version = ?2",
        )
        .bind(&poll.id)
        .bind(expected_version)
        .bind(&poll.creator_id)
        .bind(&poll.channel_id)
        .bind(&poll.question)
        .bind(options)
        .bind(datetime_to_db_text(poll.created_at))
        .bind(poll.closed_at.map(datetime_to_db_text))
        .bind(poll.is_open)
        .bind(tally)
        .bind(poll.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing matched: either the row is gone or its version moved on.
        match self.stored_version(&poll.id).await? {
            None => Err(StoreError::NotFound),
            Some(_) => Err(StoreError::Conflict {
                id: poll.id.clone(),
                expected: expected_version,
            }),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM polls WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_by_channel(&self, channel_id: &str) -> Result<Vec<Poll>, StoreError> {
        let rows = sqlx::query_as::<_, PollRow>(&format!(
            "SELECT {POLL_COLUMNS} FROM polls
             WHERE channel_id = ?1
             ORDER BY created_at DESC"
        ))
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}
