use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandAction {
    Create,
    Vote,
    Results,
    Close,
    Delete,
}

impl CommandAction {
    pub const ALL: [CommandAction; 5] = [
        CommandAction::Create,
        CommandAction::Vote,
        CommandAction::Results,
        CommandAction::Close,
        CommandAction::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommandAction::Create => "create",
            CommandAction::Vote => "vote",
            CommandAction::Results => "results",
            CommandAction::Close => "close",
            CommandAction::Delete => "delete",
        }
    }
}

impl fmt::Display for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown poll action: {}", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for CommandAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        CommandAction::ALL
            .into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| UnknownAction(s.trim().to_string()))
    }
}

/// A chat command already split into its structured parts.
///
/// `payload` is the text following the action word:
/// - create: `question | option 1 | option 2 | ...`
/// - vote: `<poll id> <option number>`
/// - results / close / delete: `<poll id>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub action: CommandAction,
    pub actor_id: String,
    pub channel_id: String,
    pub payload: String,
}
