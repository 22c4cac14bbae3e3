use serde::{Deserialize, Serialize};

use crate::transport::discord::types::API_BASE;

#[derive(Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub application_id: Option<String>,
    /// Authorization header value for interaction replies, sent verbatim.
    #[serde(default)]
    pub authorization: Option<String>,
    /// Hex Ed25519 key used to verify inbound interactions.
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    /// Bot token, only needed to register or delete the slash command.
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default = "default_command_name")]
    pub command_name: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Secrets Manager secret holding `AppId`/`Authorization`/... (optional).
    #[serde(default)]
    pub secret_name: Option<String>,
}

fn default_command_name() -> String {
    "gameserver".into()
}

fn default_api_base() -> String {
    API_BASE.into()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            application_id: None,
            authorization: None,
            public_key: None,
            guild_id: None,
            bot_token: None,
            command_name: default_command_name(),
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            secret_name: None,
        }
    }
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("application_id", &self.application_id)
            .field("guild_id", &self.guild_id)
            .field("command_name", &self.command_name)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("secret_name", &self.secret_name)
            .finish_non_exhaustive()
    }
}
