use crate::error::CoreError;
use crate::lifecycle::PollService;
use quorum_db::PollStore;
use quorum_models::command::{CommandAction, CommandRequest};
use quorum_models::poll::Poll;
use quorum_models::results::PollResults;

/// Separator between the question and the options of a create payload.
pub const OPTION_DELIMITER: char = '|';

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Created(Poll),
    Voted(Poll),
    Results(PollResults),
    Closed(String),
    Deleted(String),
}

/// Split `question | option 1 | option 2 | ...` into its parts.
///
/// Segments are trimmed here; emptiness and the option count are checked by
/// [`PollService::create`].
pub fn parse_create_payload(payload: &str) -> (String, Vec<String>) {
    let mut parts = payload.split(OPTION_DELIMITER).map(|part| part.trim().to_string());
    let question = parts.next().unwrap_or_default();
    (question, parts.collect())
}

/// Split `<poll id> <option number>`.
pub fn parse_vote_payload(payload: &str) -> Result<(String, String), CoreError> {
    let parts: Vec<&str> = payload.split_whitespace().collect();
    match parts.as_slice() {
        [poll_id, option] => Ok((poll_id.to_string(), option.to_string())),
        _ => Err(CoreError::validation(
            "payload",
            "expected '<poll id> <option number>'",
        )),
    }
}

/// The payload of results / close / delete: a single poll id.
pub fn parse_poll_id(payload: &str) -> Result<String, CoreError> {
    let parts: Vec<&str> = payload.split_whitespace().collect();
    match parts.as_slice() {
        [poll_id] => Ok(poll_id.to_string()),
        [] => Err(CoreError::validation("payload", "a poll id is required")),
        _ => Err(CoreError::validation("payload", "expected a single poll id")),
    }
}

/// Run one already-split chat command against the poll service.
pub async fn dispatch<S: PollStore>(
    service: &PollService<S>,
    request: &CommandRequest,
) -> Result<CommandOutcome, CoreError> {
    let actor = request.actor_id.as_str();
    match request.action {
        CommandAction::Create => {
            let (question, options) = parse_create_payload(&request.payload);
            let poll = service
                .create(&question, options, actor, &request.channel_id)
                .await?;
            Ok(CommandOutcome::Created(poll))
        }
        CommandAction::Vote => {
            let (poll_id, option) = parse_vote_payload(&request.payload)?;
            let poll = service.vote(&poll_id, &option, actor).await?;
            Ok(CommandOutcome::Voted(poll))
        }
        CommandAction::Results => {
            let poll_id = parse_poll_id(&request.payload)?;
            Ok(CommandOutcome::Results(service.results(&poll_id).await?))
        }
        CommandAction::Close => {
            let poll_id = parse_poll_id(&request.payload)?;
            Ok(CommandOutcome::Closed(service.close(&poll_id, actor).await?))
        }
        CommandAction::Delete => {
            let poll_id = parse_poll_id(&request.payload)?;
            Ok(CommandOutcome::Deleted(service.delete(&poll_id, actor).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::lifecycle::PollServiceConfig;
    use crate::observability::PollMetrics;
    use quorum_db::MemoryPollStore;
    use std::sync::Arc;

    fn service() -> PollService<MemoryPollStore> {
        PollService::new(
            MemoryPollStore::new(),
            PollServiceConfig::default(),
            EventBus::default(),
            Arc::new(PollMetrics::new()),
        )
    }

    fn request(action: CommandAction, actor: &str, payload: &str) -> CommandRequest {
        CommandRequest {
            action,
            actor_id: actor.to_string(),
            channel_id: "town-square".to_string(),
            payload: payload.to_string(),
        }
    }

    #[test]
    fn create_payload_is_split_and_trimmed() {
        let (question, options) = parse_create_payload(" Lunch? |Pizza|  Sushi  | Tacos");
        assert_eq!(question, "Lunch?");
        assert_eq!(options, vec!["Pizza", "Sushi", "Tacos"]);
    }

    #[test]
    fn create_payload_without_delimiter_has_no_options() {
        let (question, options) = parse_create_payload("Just a question");
        assert_eq!(question, "Just a question");
        assert!(options.is_empty());
    }

    #[test]
    fn vote_payload_needs_exactly_two_tokens() {
        assert_eq!(
            parse_vote_payload("  abc   2 ").unwrap(),
            ("abc".to_string(), "2".to_string())
        );
        assert!(parse_vote_payload("abc").is_err());
        assert!(parse_vote_payload("abc 2 3").is_err());
    }

    #[test]
    fn poll_id_payload_needs_exactly_one_token() {
        assert_eq!(parse_poll_id(" abc ").unwrap(), "abc");
        assert!(matches!(parse_poll_id("   "), Err(CoreError::Validation(_))));
        assert!(matches!(parse_poll_id("a b"), Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn full_command_flow() {
        let svc = service();

        let created = dispatch(&svc, &request(CommandAction::Create, "alice", "Q | A | B"))
            .await
            .unwrap();
        let poll = match created {
            CommandOutcome::Created(poll) => poll,
            other => panic!("expected Created, got {other:?}"),
        };
        assert_eq!(poll.options.len(), 2);

        let payload = format!("{} 1", poll.id);
        for voter in ["bob", "carol", "dave"] {
            dispatch(&svc, &request(CommandAction::Vote, voter, &payload))
                .await
                .unwrap();
        }
        dispatch(&svc, &request(CommandAction::Vote, "erin", &format!("{} 2", poll.id)))
            .await
            .unwrap();

        let outcome = dispatch(&svc, &request(CommandAction::Results, "bob", &poll.id))
            .await
            .unwrap();
        let results = match outcome {
            CommandOutcome::Results(results) => results,
            other => panic!("expected Results, got {other:?}"),
        };
        assert_eq!(results.total_votes, 4);
        assert_eq!(results.results[0].percentage, 75.0);

        let closed = dispatch(&svc, &request(CommandAction::Close, "alice", &poll.id))
            .await
            .unwrap();
        assert_eq!(closed, CommandOutcome::Closed(poll.id.clone()));

        let deleted = dispatch(&svc, &request(CommandAction::Delete, "alice", &poll.id))
            .await
            .unwrap();
        assert_eq!(deleted, CommandOutcome::Deleted(poll.id.clone()));
    }

    #[tokio::test]
    async fn create_with_single_option_is_rejected() {
        let svc = service();
        let err = dispatch(&svc, &request(CommandAction::Create, "alice", "Q | only"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn malformed_vote_payload_is_rejected_before_lookup() {
        let svc = service();
        let err = dispatch(&svc, &request(CommandAction::Vote, "bob", "missing-option"))
            .await
            .unwrap_err();
        assert!(matches!(&err, CoreError::Validation(ctx) if ctx.field == "payload"));
    }
}
