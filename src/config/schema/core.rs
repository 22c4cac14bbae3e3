use super::{
    AutoShutdownConfig, AwsConfig, DiscordConfig, GatewayConfig, ObservabilityConfig,
    ServiceConfig,
};
use crate::error::ConfigError;
use crate::service::CredentialSource;
use crate::workflow::Messages;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub discord: DiscordConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub aws: AwsConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub messages: Messages,

    #[serde(default)]
    pub auto_shutdown: AutoShutdownConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let gamekeeper_dir = home.join(".gamekeeper");

        if !gamekeeper_dir.exists() {
            fs::create_dir_all(&gamekeeper_dir)
                .context("Failed to create .gamekeeper directory")?;
        }

        Self::load_from(&gamekeeper_dir.join("config.toml"))
    }

    /// Read `path`, or write a default config there when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path = path.to_path_buf();
            Ok(config)
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
            let config = Self {
                config_path: path.to_path_buf(),
                ..Self::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(authorization) = std::env::var("GAMEKEEPER_DISCORD_AUTHORIZATION") {
            if !authorization.is_empty() {
                self.discord.authorization = Some(authorization);
            }
        }

        if let Ok(app_id) = std::env::var("GAMEKEEPER_DISCORD_APP_ID") {
            if !app_id.is_empty() {
                self.discord.application_id = Some(app_id);
            }
        }

        if let Ok(public_key) = std::env::var("GAMEKEEPER_DISCORD_PUBLIC_KEY") {
            if !public_key.is_empty() {
                self.discord.public_key = Some(public_key);
            }
        }

        if let Ok(cluster) = std::env::var("GAMEKEEPER_CLUSTER") {
            if !cluster.is_empty() {
                self.service.cluster = cluster;
            }
        }

        if let Ok(service) = std::env::var("GAMEKEEPER_SERVICE") {
            if !service.is_empty() {
                self.service.service = service;
            }
        }

        if let Ok(region) =
            std::env::var("AWS_REGION").or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        {
            if !region.is_empty() {
                self.service.region = region;
            }
        }

        if let Ok(key_id) = std::env::var("AWS_ACCESS_KEY_ID") {
            if !key_id.is_empty() {
                self.aws.access_key_id = Some(key_id);
            }
        }

        if let Ok(secret) = std::env::var("AWS_SECRET_ACCESS_KEY") {
            if !secret.is_empty() {
                self.aws.secret_access_key = Some(secret);
            }
        }

        if let Ok(token) = std::env::var("AWS_SESSION_TOKEN") {
            if !token.is_empty() {
                self.aws.session_token = Some(token);
            }
        }

        if let Ok(relative) = std::env::var("AWS_CONTAINER_CREDENTIALS_RELATIVE_URI") {
            if !relative.is_empty() {
                self.aws.set_container_relative_uri(&relative);
            }
        } else if let Ok(full) = std::env::var("AWS_CONTAINER_CREDENTIALS_FULL_URI") {
            if !full.is_empty() {
                self.aws.container_credentials_uri = Some(full);
            }
        }

        if let Ok(token) = std::env::var("AWS_CONTAINER_AUTHORIZATION_TOKEN") {
            if !token.is_empty() {
                self.aws.container_authorization_token = Some(token);
            }
        }

        if let Ok(disabled) = std::env::var("AWS_EC2_METADATA_DISABLED") {
            if disabled.eq_ignore_ascii_case("true") {
                self.aws.instance_metadata = false;
            }
        }

        if let Ok(endpoint) = std::env::var("AWS_EC2_METADATA_SERVICE_ENDPOINT") {
            if !endpoint.is_empty() {
                self.aws.instance_metadata_endpoint = endpoint;
            }
        }

        if let Ok(secret) = std::env::var("GAMEKEEPER_ALARM_SECRET") {
            if !secret.is_empty() {
                self.auto_shutdown.secret = Some(secret);
            }
        }

        if let Ok(topic_arn) = std::env::var("GAMEKEEPER_ALARM_TOPIC_ARN") {
            if !topic_arn.is_empty() {
                self.auto_shutdown.topic_arn = Some(topic_arn);
            }
        }

        if let Ok(port_str) =
            std::env::var("GAMEKEEPER_GATEWAY_PORT").or_else(|_| std::env::var("PORT"))
        {
            if let Ok(port) = port_str.parse::<u16>() {
                self.gateway.port = port;
            }
        }

        if let Ok(host) = std::env::var("GAMEKEEPER_GATEWAY_HOST") {
            if !host.is_empty() {
                self.gateway.host = host;
            }
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.service.cluster.trim().is_empty() {
            return Err(ConfigError::Validation("service.cluster is not set".into()));
        }
        if self.service.service.trim().is_empty() {
            return Err(ConfigError::Validation("service.service is not set".into()));
        }
        if self.service.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "service.timeout_secs must be greater than zero".into(),
            ));
        }
        if self.discord.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "discord.timeout_secs must be greater than zero".into(),
            ));
        }
        if let Some(key) = self.discord.public_key.as_deref() {
            if key.len() != 64 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::Validation(
                    "discord.public_key must be 64 hex characters".into(),
                ));
            }
        }
        let shutdown = &self.auto_shutdown;
        if !shutdown.cpu_utilization_min.is_finite() || shutdown.cpu_utilization_min <= 0.0 {
            return Err(ConfigError::Validation(
                "auto_shutdown.cpu_utilization_min must be a positive number".into(),
            ));
        }
        if shutdown.evaluation_periods == 0 {
            return Err(ConfigError::Validation(
                "auto_shutdown.evaluation_periods must be greater than zero".into(),
            ));
        }
        if shutdown.enabled && shutdown.secret.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::Validation(
                "auto_shutdown.secret is required when auto_shutdown is enabled".into(),
            ));
        }
        Ok(())
    }

    pub fn credential_source(&self) -> Option<CredentialSource> {
        self.aws.credential_source()
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}
