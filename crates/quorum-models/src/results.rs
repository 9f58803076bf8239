use serde::{Deserialize, Serialize};

/// Read-only percentage breakdown of a poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResults {
    pub poll_id: String,
    pub question: String,
    pub options: Vec<String>,
    pub results: Vec<OptionResult>,
    pub total_votes: u64,
    pub is_open: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionResult {
    pub option: String,
    pub vote_count: u64,
    /// 0.0 to 100.0, unrounded.
    pub percentage: f64,
}
