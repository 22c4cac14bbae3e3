use serde::{Deserialize, Serialize};

use super::machine::{Outcome, Path};

/// Reply texts, overridable from the `[messages]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messages {
    #[serde(default = "default_checking")]
    pub checking: String,
    #[serde(default = "default_starting_ack")]
    pub starting_ack: String,
    #[serde(default = "default_stopping_ack")]
    pub stopping_ack: String,
    #[serde(default = "default_unknown")]
    pub unknown: String,
    #[serde(default = "default_up")]
    pub up: String,
    #[serde(default = "default_down")]
    pub down: String,
    #[serde(default = "default_starting")]
    pub starting: String,
    #[serde(default = "default_error")]
    pub error: String,
}

fn default_checking() -> String {
    "Checking the server...".into()
}

fn default_starting_ack() -> String {
    "Starting the server...".into()
}

fn default_stopping_ack() -> String {
    "Stopping the server...".into()
}

fn default_unknown() -> String {
    "Wut?".into()
}

fn default_up() -> String {
    "The server is up!".into()
}

fn default_down() -> String {
    "The server is down.".into()
}

fn default_starting() -> String {
    "The server is starting, try again in a minute or two.".into()
}

fn default_error() -> String {
    "Something went wrong talking to the server.".into()
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            checking: default_checking(),
            starting_ack: default_starting_ack(),
            stopping_ack: default_stopping_ack(),
            unknown: default_unknown(),
            up: default_up(),
            down: default_down(),
            starting: default_starting(),
            error: default_error(),
        }
    }
}

impl Messages {
    /// Acknowledgement posted as the interaction's initial response.
    pub fn acknowledgement(&self, path: Path) -> &str {
        match path {
            Path::Describe => &self.checking,
            Path::Start => &self.starting_ack,
            Path::Stop => &self.stopping_ack,
            Path::Fallback => &self.unknown,
        }
    }

    /// Final text patched over the initial response.
    pub fn outcome(&self, outcome: Outcome) -> &str {
        match outcome {
            Outcome::Up => &self.up,
            Outcome::Down => &self.down,
            Outcome::Starting => &self.starting,
            Outcome::Error => &self.error,
        }
    }
}
