mod auto_shutdown;
mod core;
mod discord;
mod gateway;
mod observability;
mod service;

pub use auto_shutdown::AutoShutdownConfig;
pub use core::Config;
pub use discord::DiscordConfig;
pub use gateway::GatewayConfig;
pub use observability::ObservabilityConfig;
pub use service::{AwsConfig, ServiceConfig};
