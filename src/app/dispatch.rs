use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::runtime::{Runtime, resolve_discord_secret};
use crate::app::status::{render_run_report, render_status};
use crate::config::Config;
use crate::error::DiscordError;
use crate::transport::discord::{DiscordHttpClient, build_game_command};
use crate::transport::gateway::run_gateway;
use crate::workflow::{Interaction, ServiceControl};

/// Client authorized as the bot itself, for command management.
fn bot_client(config: &Config) -> Result<DiscordHttpClient> {
    let token = config
        .discord
        .bot_token
        .as_deref()
        .context("discord.bot_token is not set")?;
    let client = DiscordHttpClient::new(
        format!("Bot {token}"),
        std::time::Duration::from_secs(config.discord.timeout_secs),
    )
    .context("build Discord client")?;
    Ok(client.with_api_base(config.discord.api_base.clone()))
}

fn guild_target(config: &Config) -> Result<(&str, &str)> {
    let application_id = config
        .discord
        .application_id
        .as_deref()
        .context("discord.application_id is not set")?;
    let guild_id = config
        .discord
        .guild_id
        .as_deref()
        .context("discord.guild_id is not set")?;
    Ok((application_id, guild_id))
}

async fn register_command(mut config: Config) -> Result<()> {
    resolve_discord_secret(&mut config).await?;
    let (application_id, guild_id) = guild_target(&config)?;
    let command = build_game_command(&config.discord.command_name);

    let id = bot_client(&config)?
        .create_guild_command(application_id, guild_id, &command)
        .await
        .context("register slash command")?;

    info!(command_id = %id, "slash command registered");
    println!("Registered /{} as command {id}", config.discord.command_name);
    Ok(())
}

async fn unregister_command(mut config: Config, command_id: &str) -> Result<()> {
    resolve_discord_secret(&mut config).await?;
    let (application_id, guild_id) = guild_target(&config)?;

    match bot_client(&config)?
        .delete_guild_command(application_id, guild_id, command_id)
        .await
    {
        Ok(()) => println!("Deleted command {command_id}"),
        Err(DiscordError::Status { status, body, .. }) => {
            warn!(command_id, status, body = %body, "command delete returned an error status");
        }
        Err(error) => return Err(error).context("delete slash command"),
    }
    Ok(())
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            let port = port.unwrap_or(config.gateway.port);
            info!("Starting gateway on {host}:{port}");
            run_gateway(&host, port, Arc::new(config)).await
        }

        Commands::Run {
            sub_command,
            interaction_id,
            token,
        } => {
            let runtime = Runtime::build(config).await?;
            let runner = runtime.workflow_runner()?;
            let report = runner
                .run(&Interaction::new(interaction_id, token, sub_command))
                .await?;
            println!("{}", render_run_report(&report));
            Ok(())
        }

        Commands::Status => {
            let runtime = Runtime::build(config).await?;
            let status = runtime.service.describe().await?;
            println!("{}", render_status(&runtime.config, status));
            Ok(())
        }

        Commands::Register => register_command(config).await,

        Commands::Unregister { command_id } => unregister_command(config, &command_id).await,

        Commands::Shutdown => {
            let runtime = Runtime::build(config).await?;
            let status = runtime.service.set_desired_count(0).await?;
            println!(
                "Desired count set to 0 ({} task(s) still running)",
                status.running_count
            );
            Ok(())
        }
    }
}
