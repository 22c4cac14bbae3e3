pub mod schema;

pub use schema::{
    AutoShutdownConfig, AwsConfig, Config, DiscordConfig, GatewayConfig, ObservabilityConfig,
    ServiceConfig,
};
