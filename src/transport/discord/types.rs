//! Discord API constants and type definitions.

/// Discord API base URL (v10).
pub const API_BASE: &str = "https://discord.com/api/v10";

/// Discord maximum message length (characters).
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Interaction tokens stay valid for 15 minutes after the interaction.
pub const INTERACTION_TOKEN_TTL_SECS: u64 = 15 * 60;

/// Header carrying the hex Ed25519 signature of an inbound interaction.
pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";

/// Header carrying the timestamp that prefixes the signed body.
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Interaction types the gateway handles. Components, autocomplete and
/// modals map to `None` and are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InteractionType {
    Ping = 1,
    ApplicationCommand = 2,
}

impl InteractionType {
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Ping),
            2 => Some(Self::ApplicationCommand),
            _ => None,
        }
    }
}

/// Interaction callback types for responding to interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InteractionCallbackType {
    /// ACK a Ping.
    Pong = 1,
    /// Respond to an interaction with a message.
    ChannelMessageWithSource = 4,
}

/// Application command option types used by the game command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandOptionType {
    SubCommand = 1,
}

/// Application command types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    ChatInput = 1,
}
