use serde::{Deserialize, Serialize};

/// One inbound slash-command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Interaction {
    pub interaction_id: String,
    /// Short-lived token authorizing responses to this interaction.
    pub interaction_token: String,
    pub sub_command: String,
}

impl Interaction {
    pub fn new(
        interaction_id: impl Into<String>,
        interaction_token: impl Into<String>,
        sub_command: impl Into<String>,
    ) -> Self {
        Self {
            interaction_id: interaction_id.into(),
            interaction_token: interaction_token.into(),
            sub_command: sub_command.into(),
        }
    }
}

/// The closed set of sub-commands the bot understands.
///
/// Matching is exact and case-sensitive; anything else is `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubCommand {
    Status,
    Start,
    Stop,
    Other(String),
}

impl SubCommand {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "status" => Self::Status,
            "start" => Self::Start,
            "stop" => Self::Stop,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Status => "status",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Other(raw) => raw,
        }
    }
}

/// Replica counts of the managed service at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub running_count: u32,
    pub desired_count: u32,
}

impl ServiceStatus {
    pub fn is_running(self) -> bool {
        self.running_count > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    Initial,
    Update,
}

/// Text sent back to the chat platform; consumed once by the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub content: String,
    pub mode: ResponseMode,
}

impl ResponseMessage {
    pub fn initial(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            mode: ResponseMode::Initial,
        }
    }

    pub fn update(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            mode: ResponseMode::Update,
        }
    }
}
