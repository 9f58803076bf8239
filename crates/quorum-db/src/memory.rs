use crate::{PollStore, StoreError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use quorum_models::poll::Poll;
use std::sync::Arc;

/// Process-local poll store.
///
/// The version check in `put` runs while the shard's write guard is held, so
/// compare-and-swap is atomic with respect to other writers of the same id.
#[derive(Clone, Default)]
pub struct MemoryPollStore {
    polls: Arc<DashMap<String, Poll>>,
}

impl MemoryPollStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.polls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polls.is_empty()
    }
}

impl PollStore for MemoryPollStore {
    async fn get(&self, id: &str) -> Result<Poll, StoreError> {
        self.polls
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn insert(&self, poll: &Poll) -> Result<(), StoreError> {
        match self.polls.entry(poll.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(poll.id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(poll.clone());
                Ok(())
            }
        }
    }

    async fn put(&self, poll: &Poll, expected_version: i64) -> Result<(), StoreError> {
        let mut stored = self.polls.get_mut(&poll.id).ok_or(StoreError::NotFound)?;
        if stored.version != expected_version {
            return Err(StoreError::Conflict {
                id: poll.id.clone(),
                expected: expected_version,
            });
        }
        *stored = poll.clone();
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.polls
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list_by_channel(&self, channel_id: &str) -> Result<Vec<Poll>, StoreError> {
        let mut polls: Vec<Poll> = self
            .polls
            .iter()
            .filter(|entry| entry.channel_id == channel_id)
            .map(|entry| entry.value().clone())
            .collect();
        polls.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(polls)
    }
}
