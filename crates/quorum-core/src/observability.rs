use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for poll activity, shared by every handle of the poll service.
#[derive(Debug, Default)]
pub struct PollMetrics {
    polls_created: AtomicU64,
    votes_applied: AtomicU64,
    polls_closed: AtomicU64,
    polls_deleted: AtomicU64,
    write_conflicts: AtomicU64,
    retries_exhausted: AtomicU64,
    storage_failures: AtomicU64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PollMetricsSnapshot {
    pub polls_created: u64,
    pub votes_applied: u64,
    pub polls_closed: u64,
    pub polls_deleted: u64,
    pub write_conflicts: u64,
    pub retries_exhausted: u64,
    pub storage_failures: u64,
}

impl PollMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poll_created(&self) {
        self.polls_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn vote_applied(&self) {
        self.votes_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn poll_closed(&self) {
        self.polls_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn poll_deleted(&self) {
        self.polls_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn write_conflict(&self) {
        self.write_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn retries_exhausted(&self) {
        self.retries_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn storage_failure(&self) {
        self.storage_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PollMetricsSnapshot {
        PollMetricsSnapshot {
            polls_created: self.polls_created.load(Ordering::Relaxed),
            votes_applied: self.votes_applied.load(Ordering::Relaxed),
            polls_closed: self.polls_closed.load(Ordering::Relaxed),
            polls_deleted: self.polls_deleted.load(Ordering::Relaxed),
            write_conflicts: self.write_conflicts.load(Ordering::Relaxed),
            retries_exhausted: self.retries_exhausted.load(Ordering::Relaxed),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
        }
    }
}
