//! Pure state transitions for a poll. Nothing here touches storage; callers
//! pass in the copy they read and persist the returned value themselves.

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use quorum_models::poll::Poll;

/// Count one vote for the option at 0-based `option_index`.
///
/// Checks run in a fixed order: a closed poll is reported before an invalid
/// option. The input is left untouched and the next version is returned.
pub fn apply_vote(poll: &Poll, option_index: i64) -> Result<Poll, CoreError> {
    if !poll.is_open {
        return Err(CoreError::ClosedPoll {
            id: poll.id.clone(),
        });
    }
    let index = usize::try_from(option_index)
        .ok()
        .filter(|i| poll.has_option(*i))
        .ok_or(CoreError::InvalidOption {
            number: option_index.saturating_add(1),
            available: poll.options.len(),
        })?;

    let mut next = poll.clone();
    *next.tally.entry(index).or_insert(0) += 1;
    next.version += 1;
    Ok(next)
}

/// Close an open poll at `now`.
pub fn close_poll(poll: &Poll, now: DateTime<Utc>) -> Result<Poll, CoreError> {
    if !poll.is_open {
        return Err(CoreError::AlreadyClosed {
            id: poll.id.clone(),
        });
    }
    let mut next = poll.clone();
    next.is_open = false;
    next.closed_at = Some(now);
    next.version += 1;
    Ok(next)
}
