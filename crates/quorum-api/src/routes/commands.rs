use axum::{
    extract::{FromRequest, Request, State},
    http::header,
    Form, Json,
};
use quorum_core::command::{self, CommandOutcome};
use quorum_core::error::{CoreError, ErrorContext};
use quorum_core::AppState;
use quorum_models::command::{CommandAction, CommandRequest};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::render;

const TRY_AGAIN: &str = "Something went wrong while handling your poll command, please try again.";

/// Slash-command webhook body, as posted by the chat platform.
#[derive(Debug, Clone, Deserialize)]
pub struct SlashCommand {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub text: String,
}

/// Accepts either `application/json` or a url-encoded form.
pub struct SlashCommandBody(pub SlashCommand);

impl<S> FromRequest<S> for SlashCommandBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        if is_json {
            let Json(body) = Json::<SlashCommand>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            Ok(Self(body))
        } else {
            let Form(body) = Form::<SlashCommand>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            Ok(Self(body))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    InChannel,
    Ephemeral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub response_type: ResponseType,
    pub text: String,
}

impl CommandResponse {
    fn in_channel(text: String) -> Self {
        Self {
            response_type: ResponseType::InChannel,
            text,
        }
    }

    fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::Ephemeral,
            text: text.into(),
        }
    }
}

fn strip_word<'a>(line: &'a str, word: &str) -> Option<&'a str> {
    let (first, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    first.eq_ignore_ascii_case(word).then(|| rest.trim_start())
}

/// Split `command` + `text` into the action word and its payload.
///
/// `/poll vote abc 1`, `command=/poll text="vote abc 1"` and
/// `command=vote text="abc 1"` all yield `("vote", "abc 1")`.
pub fn split_command(command: &str, text: &str) -> (String, String) {
    let line = format!("{} {}", command.trim().trim_start_matches('/'), text.trim());
    let line = line.trim();
    let line = strip_word(line, "poll").unwrap_or(line);
    let (action, payload) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    (action.to_string(), payload.trim().to_string())
}

pub fn parse_action(word: &str) -> Option<CommandAction> {
    if word.eq_ignore_ascii_case("end") {
        return Some(CommandAction::Close);
    }
    word.parse().ok()
}

pub fn usage(action: CommandAction) -> &'static str {
    match action {
        CommandAction::Create => "/poll create <question> | <option 1> | <option 2> [| ...]",
        CommandAction::Vote => "/poll vote <poll id> <option number>",
        CommandAction::Results => "/poll results <poll id>",
        CommandAction::Close => "/poll close <poll id>",
        CommandAction::Delete => "/poll delete <poll id>",
    }
}

fn help_text() -> String {
    let lines: Vec<&str> = CommandAction::ALL.into_iter().map(usage).collect();
    format!("Available poll commands:\n{}", lines.join("\n"))
}

fn response_for(outcome: &CommandOutcome) -> CommandResponse {
    let text = render::outcome(outcome);
    match outcome {
        CommandOutcome::Deleted(_) => CommandResponse::ephemeral(text),
        _ => CommandResponse::in_channel(text),
    }
}

fn rejection_text(action: CommandAction, err: &CoreError) -> String {
    match err {
        CoreError::Validation(_) => format!("{err}\nUsage: {}", usage(action)),
        _ => err.to_string(),
    }
}

/// POST /api/v1/commands
pub async fn handle_command(
    State(state): State<AppState>,
    SlashCommandBody(body): SlashCommandBody,
) -> Result<Json<CommandResponse>, ApiError> {
    if body.user_id.trim().is_empty() {
        return Err(ApiError::Validation(ErrorContext::new(
            "user_id",
            "must not be empty",
        )));
    }
    if body.channel_id.trim().is_empty() {
        return Err(ApiError::Validation(ErrorContext::new(
            "channel_id",
            "must not be empty",
        )));
    }

    let (word, payload) = split_command(&body.command, &body.text);
    let Some(action) = parse_action(&word) else {
        return Ok(Json(CommandResponse::ephemeral(help_text())));
    };

    tracing::debug!(
        action = %action,
        channel_id = %body.channel_id,
        user_id = %body.user_id,
        "handling poll command"
    );

    let request = CommandRequest {
        action,
        actor_id: body.user_id,
        channel_id: body.channel_id,
        payload,
    };

    let response = match command::dispatch(&state.polls, &request).await {
        Ok(outcome) => response_for(&outcome),
        Err(err) if err.is_operational() => {
            tracing::error!(
                action = %action,
                channel_id = %request.channel_id,
                user_id = %request.actor_id,
                error = %err,
                "poll command failed"
            );
            CommandResponse::ephemeral(TRY_AGAIN)
        }
        Err(err) => {
            tracing::info!(
                action = %action,
                user_id = %request.actor_id,
                reason = %err,
                "poll command rejected"
            );
            CommandResponse::ephemeral(rejection_text(action, &err))
        }
    };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_accepts_every_command_shape() {
        let expected = ("vote".to_string(), "abc 1".to_string());
        assert_eq!(split_command("/poll", "vote abc 1"), expected);
        assert_eq!(split_command("/poll vote", "abc 1"), expected);
        assert_eq!(split_command("vote", "abc 1"), expected);
        assert_eq!(split_command("/vote", "  abc 1 "), expected);
        assert_eq!(split_command("", "poll vote abc 1"), expected);
    }

    #[test]
    fn split_keeps_create_payload_intact() {
        let (action, payload) = split_command("/poll", "create Lunch today? | Pizza | Sushi");
        assert_eq!(action, "create");
        assert_eq!(payload, "Lunch today? | Pizza | Sushi");
    }

    #[test]
    fn bare_poll_has_no_action() {
        let (action, payload) = split_command("/poll", "");
        assert_eq!(action, "");
        assert_eq!(payload, "");
        assert_eq!(parse_action(&action), None);
    }

    #[test]
    fn end_is_an_alias_for_close() {
        assert_eq!(parse_action("end"), Some(CommandAction::Close));
        assert_eq!(parse_action("CLOSE"), Some(CommandAction::Close));
        assert_eq!(parse_action("launch"), None);
    }

    #[test]
    fn validation_rejections_include_usage() {
        let text = rejection_text(
            CommandAction::Vote,
            &CoreError::validation("payload", "expected '<poll id> <option number>'"),
        );
        assert!(text.ends_with("Usage: /poll vote <poll id> <option number>"));

        let text = rejection_text(CommandAction::Close, &CoreError::Forbidden);
        assert_eq!(text, CoreError::Forbidden.to_string());
    }
}
