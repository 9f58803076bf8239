use quorum_models::poll::Poll;
use quorum_models::results::{OptionResult, PollResults};

/// Derive the per-option breakdown of `poll`.
///
/// Each percentage is taken against the final total, so the output does not
/// depend on option order. A poll without votes reports 0% everywhere.
pub fn project(poll: &Poll) -> PollResults {
    let total_votes = poll.total_votes();
    let results = poll
        .options
        .iter()
        .enumerate()
        .map(|(index, option)| {
            let vote_count = poll.votes_for(index);
            let percentage = if total_votes == 0 {
                0.0
            } else {
                100.0 * vote_count as f64 / total_votes as f64
            };
            OptionResult {
                option: option.clone(),
                vote_count,
                percentage,
            }
        })
        .collect();

    PollResults {
        poll_id: poll.id.clone(),
        question: poll.question.clone(),
        options: poll.options.clone(),
        results,
        total_votes,
        is_open: poll.is_open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn poll_with(options: &[&str], tally: &[(usize, u64)]) -> Poll {
        Poll {
            id: "p1".into(),
            creator_id: "alice".into(),
            channel_id: "c1".into(),
            question: "Pick one".into(),
            options: options.iter().map(|s| s.to_string()).collect(),
            created_at: Utc::now(),
            closed_at: None,
            is_open: true,
            tally: tally.iter().copied().collect::<BTreeMap<_, _>>(),
            version: 4,
        }
    }

    #[test]
    fn three_to_one_split() {
        let results = project(&poll_with(&["A", "B"], &[(0, 3), (1, 1)]));
        assert_eq!(results.total_votes, 4);
        assert_eq!(results.results[0].option, "A");
        assert_eq!(results.results[0].vote_count, 3);
        assert_eq!(format!("{:.2}", results.results[0].percentage), "75.00");
        assert_eq!(format!("{:.2}", results.results[1].percentage), "25.00");
    }

    #[test]
    fn no_votes_means_zero_percent() {
        let results = project(&poll_with(&["A", "B", "C"], &[]));
        assert_eq!(results.total_votes, 0);
        assert!(results.results.iter().all(|r| r.percentage == 0.0));
    }

    #[test]
    fn percentages_use_final_total_regardless_of_order() {
        let forward = project(&poll_with(&["A", "B", "C"], &[(0, 1), (1, 1), (2, 2)]));
        let reversed = project(&poll_with(&["C", "B", "A"], &[(0, 2), (1, 1), (2, 1)]));
        assert_eq!(forward.results[0].percentage, 25.0);
        assert_eq!(forward.results[2].percentage, 50.0);
        assert_eq!(reversed.results[0].percentage, forward.results[2].percentage);
        assert_eq!(reversed.results[2].percentage, forward.results[0].percentage);
    }

    #[test]
    fn projection_is_idempotent() {
        let poll = poll_with(&["A", "B"], &[(1, 7)]);
        assert_eq!(project(&poll), project(&poll));
    }

    #[test]
    fn carries_poll_state() {
        let mut poll = poll_with(&["A", "B"], &[]);
        poll.is_open = false;
        let results = project(&poll);
        assert_eq!(results.poll_id, "p1");
        assert!(!results.is_open);
        assert_eq!(results.options, vec!["A", "B"]);
    }
}
