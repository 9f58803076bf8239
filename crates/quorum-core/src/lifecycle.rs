use crate::error::CoreError;
use crate::events::{EventBus, PollEventKind};
use crate::observability::PollMetrics;
use crate::{id, results, tally};
use chrono::Utc;
use quorum_db::{PollStore, StoreError};
use quorum_models::poll::{Poll, MIN_POLL_OPTIONS};
use quorum_models::results::PollResults;
use rand::Rng;
use std::collections::hash_map::DefaultHasher;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::num::IntErrorKind;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 5;
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(10);

const MAX_RETRY_BACKOFF: Duration = Duration::from_millis(500);
const WRITE_GATE_STRIPES: usize = 64;

#[derive(Clone, Debug)]
pub struct PollServiceConfig {
    /// Read-compute-write cycles a mutation may run before giving up.
    pub max_write_attempts: u32,
    /// Upper bound on a single store call.
    pub store_timeout: Duration,
    /// Base delay before re-reading after a lost race. Each retry waits a
    /// random time up to `retry_backoff * 2^(attempt - 1)`; zero disables it.
    pub retry_backoff: Duration,
}

impl Default for PollServiceConfig {
    fn default() -> Self {
        Self {
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

/// Random delay in `[0, base * 2^(attempt - 1)]`, capped.
fn jittered_backoff(base: Duration, attempt: u32) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    let ceiling = base
        .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
        .min(MAX_RETRY_BACKOFF);
    let micros = u64::try_from(ceiling.as_micros()).unwrap_or(u64::MAX);
    Duration::from_micros(rand::thread_rng().gen_range(0..=micros))
}

/// Create, vote, close and delete polls against a [`PollStore`].
///
/// Votes and closes use optimistic concurrency: read the record, compute the
/// next value with the pure functions in [`tally`], then write it back only if
/// the stored version is unchanged. A lost race re-reads and recomputes, up to
/// `max_write_attempts` times, with a jittered pause in between.
///
/// Mutations of the same poll issued through one service (and its clones)
/// also queue on a striped in-process gate, so the version check only has to
/// arbitrate between processes sharing the store.
pub struct PollService<S> {
    store: Arc<S>,
    config: PollServiceConfig,
    events: EventBus,
    metrics: Arc<PollMetrics>,
    write_gates: Arc<[Mutex<()>]>,
}

impl<S> Clone for PollService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            events: self.events.clone(),
            metrics: self.metrics.clone(),
            write_gates: self.write_gates.clone(),
        }
    }
}

impl<S: PollStore> PollService<S> {
    pub fn new(
        store: S,
        config: PollServiceConfig,
        events: EventBus,
        metrics: Arc<PollMetrics>,
    ) -> Self {
        Self {
            store: Arc::new(store),
            config,
            events,
            metrics,
            write_gates: (0..WRITE_GATE_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn metrics(&self) -> &PollMetrics {
        &self.metrics
    }

    async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.config.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout),
        }
    }

    /// Map a store error for poll `id`, counting storage faults.
    fn store_error(&self, id: &str, err: StoreError) -> CoreError {
        match err {
            StoreError::NotFound => CoreError::NotFound { id: id.to_string() },
            other => {
                if other.is_storage_failure() {
                    self.metrics.storage_failure();
                    tracing::error!(poll_id = %id, error = %other, "poll store failure");
                }
                CoreError::Storage(other)
            }
        }
    }

    pub async fn get(&self, id: &str) -> Result<Poll, CoreError> {
        self.call(self.store.get(id))
            .await
            .map_err(|e| self.store_error(id, e))
    }

    pub async fn list_channel(&self, channel_id: &str) -> Result<Vec<Poll>, CoreError> {
        self.call(self.store.list_by_channel(channel_id))
            .await
            .map_err(|e| self.store_error(channel_id, e))
    }

    pub async fn create(
        &self,
        question: &str,
        options: Vec<String>,
        creator_id: &str,
        channel_id: &str,
    ) -> Result<Poll, CoreError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(CoreError::validation("question", "must not be empty"));
        }
        let mut trimmed = Vec::with_capacity(options.len());
        for (i, option) in options.iter().enumerate() {
            let option = option.trim();
            if option.is_empty() {
                return Err(CoreError::validation(
                    "options",
                    format!("option {} is empty", i + 1),
                ));
            }
            trimmed.push(option.to_string());
        }
        if trimmed.len() < MIN_POLL_OPTIONS {
            return Err(CoreError::validation(
                "options",
                format!("at least {MIN_POLL_OPTIONS} options are required"),
            ));
        }

        let poll = Poll {
            id: id::new_poll_id(),
            creator_id: creator_id.to_string(),
            channel_id: channel_id.to_string(),
            question: question.to_string(),
            options: trimmed,
            created_at: Utc::now(),
            closed_at: None,
            is_open: true,
            tally: Default::default(),
            version: 0,
        };

        self.call(self.store.insert(&poll))
            .await
            .map_err(|e| self.store_error(&poll.id, e))?;

        self.metrics.poll_created();
        self.events.dispatch(PollEventKind::PollCreate, &poll);
        tracing::info!(
            poll_id = %poll.id,
            channel_id = %poll.channel_id,
            creator_id = %poll.creator_id,
            options = poll.options.len(),
            "poll created"
        );
        Ok(poll)
    }

    /// Record one vote. `option_selector` is the 1-based option number as typed.
    pub async fn vote(
        &self,
        id: &str,
        option_selector: &str,
        voter_id: &str,
    ) -> Result<Poll, CoreError> {
        let poll = self
            .mutate(id, |current| {
                let number = parse_option_number(option_selector)?;
                tally::apply_vote(current, number.saturating_sub(1))
            })
            .await?;

        self.metrics.vote_applied();
        self.events.dispatch(PollEventKind::PollVote, &poll);
        tracing::info!(
            poll_id = %id,
            option = %option_selector.trim(),
            voter_id = %voter_id,
            "vote registered"
        );
        Ok(poll)
    }

    /// Close a poll. Only its creator may do so, and only once.
    pub async fn close(&self, id: &str, actor_id: &str) -> Result<String, CoreError> {
        let poll = self
            .mutate(id, |current| {
                if current.creator_id != actor_id {
                    return Err(CoreError::Forbidden);
                }
                tally::close_poll(current, Utc::now())
            })
            .await?;

        self.metrics.poll_closed();
        self.events.dispatch(PollEventKind::PollClose, &poll);
        tracing::info!(poll_id = %id, actor_id = %actor_id, "poll closed");
        Ok(poll.id)
    }

    /// Remove a poll for good. Only its creator may do so.
    pub async fn delete(&self, id: &str, actor_id: &str) -> Result<String, CoreError> {
        let poll = self.get(id).await?;
        if poll.creator_id != actor_id {
            return Err(CoreError::Forbidden);
        }
        self.call(self.store.delete(id))
            .await
            .map_err(|e| self.store_error(id, e))?;

        self.metrics.poll_deleted();
        self.events.dispatch(PollEventKind::PollDelete, &poll);
        tracing::info!(poll_id = %id, actor_id = %actor_id, "poll deleted");
        Ok(poll.id)
    }

    pub async fn results(&self, id: &str) -> Result<PollResults, CoreError> {
        let poll = self.get(id).await?;
        Ok(results::project(&poll))
    }

    fn write_gate(&self, id: &str) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        &self.write_gates[(hasher.finish() as usize) % self.write_gates.len()]
    }

    /// Read-compute-write with a version check, retried on lost races.
    async fn mutate<F>(&self, id: &str, compute: F) -> Result<Poll, CoreError>
    where
        F: Fn(&Poll) -> Result<Poll, CoreError>,
    {
        let _gate = self.write_gate(id).lock().await;
        let attempts = self.config.max_write_attempts.max(1);
        for attempt in 1..=attempts {
            if attempt > 1 {
                let pause = jittered_backoff(self.config.retry_backoff, attempt - 1);
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
            }
            let current = self.get(id).await?;
            let next = compute(&current)?;
            match self.call(self.store.put(&next, current.version)).await {
                Ok(()) => return Ok(next),
                Err(StoreError::Conflict { expected, .. }) => {
                    self.metrics.write_conflict();
                    tracing::warn!(
                        poll_id = %id,
                        attempt,
                        expected_version = expected,
                        "poll write conflict, retrying"
                    );
                }
                Err(e) => return Err(self.store_error(id, e)),
            }
        }

        self.metrics.retries_exhausted();
        tracing::warn!(poll_id = %id, attempts, "poll write retries exhausted");
        Err(CoreError::ConcurrencyExhausted {
            id: id.to_string(),
            attempts,
        })
    }
}

/// Parse a typed option number. Range checks belong to the tally engine, so
/// numbers too large for `i64` saturate instead of failing here.
pub fn parse_option_number(selector: &str) -> Result<i64, CoreError> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(CoreError::validation("option", "an option number is required"));
    }
    match selector.parse::<i64>() {
        Ok(number) => Ok(number),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(CoreError::validation(
                "option",
                format!("'{selector}' is not a number"),
            )),
        },
    }
}
