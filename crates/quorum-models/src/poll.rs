use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum number of options a poll must offer.
pub const MIN_POLL_OPTIONS: usize = 2;

/// A poll posted into a channel.
///
/// `tally` maps a 0-based option index to its vote count; indices without an
/// entry have zero votes. `version` increases on every successful mutation and
/// is what the store compares on conditional writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    pub creator_id: String,
    pub channel_id: String,
    pub question: String,
    pub options: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub is_open: bool,
    #[serde(default)]
    pub tally: BTreeMap<usize, u64>,
    pub version: i64,
}

impl Poll {
    /// Votes recorded for the option at `index`.
    pub fn votes_for(&self, index: usize) -> u64 {
        self.tally.get(&index).copied().unwrap_or(0)
    }

    pub fn total_votes(&self) -> u64 {
        self.tally.values().sum()
    }

    /// True when the poll can accept `index` as a vote target.
    pub fn has_option(&self, index: usize) -> bool {
        index < self.options.len()
    }
}
