use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `Gamekeeper` - Discord slash-command control for an ECS game server.
#[derive(Parser, Debug)]
#[command(name = "gamekeeper")]
#[command(version)]
#[command(about = "Start, stop, and check a game server from Discord.", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.gamekeeper/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactions gateway (Discord webhook + idle alarms)
    Serve {
        /// Port to listen on (use 0 for random available port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Run one interaction workflow directly
    Run {
        /// Sub-command as typed in Discord (status, start, stop)
        #[arg(long)]
        sub_command: String,

        /// Interaction id from Discord
        #[arg(long)]
        interaction_id: String,

        /// Interaction token from Discord
        #[arg(long)]
        token: String,
    },

    /// Show the game server's running and desired counts
    Status,

    /// Register the slash command in the configured guild
    Register,

    /// Delete a registered slash command
    Unregister {
        /// Command id printed by `register`
        command_id: String,
    },

    /// Scale the game server to zero now
    Shutdown,
}
