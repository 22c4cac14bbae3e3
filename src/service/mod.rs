//! Managed container service access (ECS) and the AWS plumbing it needs.

mod aws_json;
pub mod credentials;
pub mod ecs;
pub mod secrets;
pub mod sigv4;

pub use credentials::{CredentialSource, CredentialsProvider};
pub use ecs::{EcsClient, ManagedService};
pub use secrets::{DiscordSecret, fetch_discord_secret};
pub use sigv4::AwsCredentials;
