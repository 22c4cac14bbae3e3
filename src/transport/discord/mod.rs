pub mod commands;
pub mod http_client;
pub mod notifier;
pub mod signature;
pub mod types;

pub use commands::{build_game_command, extract_sub_command};
pub use http_client::DiscordHttpClient;
pub use notifier::DiscordNotifier;
pub use signature::{parse_public_key, verify_interaction_signature};
