//! Outbound chat text for command outcomes.

use quorum_core::command::CommandOutcome;
use quorum_models::poll::Poll;
use quorum_models::results::PollResults;
use std::fmt::Write;

pub fn created(poll: &Poll) -> String {
    let mut text = format!("Poll created!\n**{}**\n", poll.question);
    for (index, option) in poll.options.iter().enumerate() {
        let _ = writeln!(
            text,
            ":white_check_mark: {option} - `/poll vote {} {}`",
            poll.id,
            index + 1
        );
    }
    let _ = writeln!(text, "See the results with `/poll results {}`", poll.id);
    let _ = write!(text, "The creator can end it with `/poll close {}`", poll.id);
    text
}

pub fn voted() -> String {
    "Vote counted!".to_string()
}

pub fn results(results: &PollResults) -> String {
    let mut text = format!("**Poll results: {}**", results.question);
    if !results.is_open {
        text.push_str(" (closed)");
    }
    text.push('\n');
    for (index, entry) in results.results.iter().enumerate() {
        let _ = writeln!(
            text,
            "{}. {}: {} ({:.2}%)",
            index + 1,
            entry.option,
            entry.vote_count,
            entry.percentage
        );
    }
    let _ = write!(text, "Total votes: {}", results.total_votes);
    text
}

pub fn closed(poll_id: &str) -> String {
    format!("Poll **{poll_id}** closed.")
}

pub fn deleted(poll_id: &str) -> String {
    format!("Poll **{poll_id}** deleted.")
}

pub fn outcome(outcome: &CommandOutcome) -> String {
    match outcome {
        CommandOutcome::Created(poll) => created(poll),
        CommandOutcome::Voted(_) => voted(),
        CommandOutcome::Results(projection) => results(projection),
        CommandOutcome::Closed(id) => closed(id),
        CommandOutcome::Deleted(id) => deleted(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_models::results::OptionResult;

    #[test]
    fn results_use_two_decimals_and_option_order() {
        let projection = PollResults {
            poll_id: "p1".into(),
            question: "Lunch?".into(),
            options: vec!["Pizza".into(), "Sushi".into(), "Tacos".into()],
            results: vec![
                OptionResult {
                    option: "Pizza".into(),
                    vote_count: 1,
                    percentage: 100.0 / 3.0,
                },
                OptionResult {
                    option: "Sushi".into(),
                    vote_count: 2,
                    percentage: 200.0 / 3.0,
                },
                OptionResult {
                    option: "Tacos".into(),
                    vote_count: 0,
                    percentage: 0.0,
                },
            ],
            total_votes: 3,
            is_open: false,
        };

        assert_eq!(
            results(&projection),
            "**Poll results: Lunch?** (closed)\n\
             1. Pizza: 1 (33.33%)\n\
             2. Sushi: 2 (66.67%)\n\
             3. Tacos: 0 (0.00%)\n\
             Total votes: 3"
        );
    }

    #[test]
    fn closed_and_deleted_name_the_poll() {
        assert_eq!(closed("abc"), "Poll **abc** closed.");
        assert_eq!(deleted("abc"), "Poll **abc** deleted.");
    }
}
