use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::service::{CredentialsProvider, EcsClient, ManagedService, fetch_discord_secret};
use crate::transport::discord::{DiscordHttpClient, DiscordNotifier};
use crate::workflow::{ServiceControl, WorkflowRunner};

/// Everything a command needs once config and credentials are resolved.
pub struct Runtime {
    pub config: Arc<Config>,
    pub ecs: Arc<EcsClient>,
    pub service: Arc<ManagedService>,
}

impl Runtime {
    /// Resolve credentials (Secrets Manager when configured), validate, and
    /// build the ECS client.
    pub async fn build(mut config: Config) -> Result<Self> {
        let credentials = credentials_provider(&config)?;
        overlay_discord_secret(&mut config, &credentials).await?;
        config.validate()?;

        let ecs = Arc::new(
            EcsClient::new(
                &config.service.region,
                config.service.endpoint.as_deref(),
                credentials,
                Duration::from_secs(config.service.timeout_secs),
            )
            .context("build ECS client")?,
        );
        let service = Arc::new(ManagedService::new(
            Arc::clone(&ecs),
            config.service.cluster.clone(),
            config.service.service.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            ecs,
            service,
        })
    }

    pub fn discord_timeout(&self) -> Duration {
        Duration::from_secs(self.config.discord.timeout_secs)
    }

    pub fn discord_client(&self, authorization: &str) -> Result<DiscordHttpClient> {
        Ok(DiscordHttpClient::new(authorization, self.discord_timeout())
            .context("build Discord client")?
            .with_api_base(self.config.discord.api_base.clone()))
    }

    /// Runner wired to the real service and the interaction-reply credential.
    pub fn workflow_runner(&self) -> Result<WorkflowRunner> {
        let discord = &self.config.discord;
        let application_id = discord
            .application_id
            .as_deref()
            .context("discord.application_id is not set")?;
        let authorization = discord
            .authorization
            .as_deref()
            .context("discord.authorization is not set")?;

        let notifier = DiscordNotifier::new(self.discord_client(authorization)?, application_id);
        let service: Arc<dyn ServiceControl> = self.service.clone();
        Ok(WorkflowRunner::new(
            service,
            Arc::new(notifier),
            self.config.messages.clone(),
        ))
    }
}

fn credentials_provider(config: &Config) -> Result<Arc<CredentialsProvider>> {
    let source = config.credential_source().context(
        "AWS credentials are not configured (set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY, \
         or run with a task or instance role)",
    )?;
    tracing::debug!(source = ?source, "resolving AWS credentials");
    let timeout = Duration::from_secs(config.service.timeout_secs);
    let provider =
        CredentialsProvider::new(source, timeout).context("build AWS credentials provider")?;
    Ok(Arc::new(provider))
}

/// Overlay the Secrets Manager credential onto `[discord]` when
/// `discord.secret_name` is set. No-op otherwise.
pub async fn resolve_discord_secret(config: &mut Config) -> Result<()> {
    if config.discord.secret_name.is_none() {
        return Ok(());
    }
    let credentials = credentials_provider(config)?;
    overlay_discord_secret(config, &credentials).await
}

async fn overlay_discord_secret(
    config: &mut Config,
    credentials: &Arc<CredentialsProvider>,
) -> Result<()> {
    let Some(secret_name) = config.discord.secret_name.clone() else {
        return Ok(());
    };
    let secret = fetch_discord_secret(
        &config.service.region,
        config.service.secrets_endpoint.as_deref(),
        Arc::clone(credentials),
        Duration::from_secs(config.service.timeout_secs),
        &secret_name,
    )
    .await
    .with_context(|| format!("fetch Discord secret {secret_name}"))?;

    let discord = &mut config.discord;
    if secret.app_id.is_some() {
        discord.application_id = secret.app_id;
    }
    if secret.authorization.is_some() {
        discord.authorization = secret.authorization;
    }
    if secret.public_key.is_some() {
        discord.public_key = secret.public_key;
    }
    if secret.guild_id.is_some() {
        discord.guild_id = secret.guild_id;
    }
    if secret.bot_token.is_some() {
        discord.bot_token = secret.bot_token;
    }
    tracing::info!(secret = %secret_name, "loaded Discord credential from Secrets Manager");
    Ok(())
}
