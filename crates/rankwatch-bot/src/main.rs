//! rankwatch - Entry Point
//!
//! `run` (the default) polls tracked players until Ctrl-C. The other
//! subcommands perform one operator action against the snapshot store and
//! exit. `sweep` and `refresh` refuse to run while a daemon is sweeping the
//! same snapshot.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rankwatch_bot::commands::{
    leaderboard_lines, refreshed_message, sweep_summary, tracked_message, untracked_message,
};
use rankwatch_bot::{AppConfig, Application, Secrets};
use rankwatch_core::{ChannelId, GuildId};
use rankwatch_engine::CommandResult;
use tracing::info;

/// Ranked-ladder tracker with chat notifications
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via RANKWATCH_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll tracked players until Ctrl-C
    Run,
    /// Run a single sweep over every tracked player and exit
    Sweep,
    /// Start tracking a player for a guild
    Track {
        guild: u64,
        region: String,
        /// Riot ID as name#tag
        riot_id: String,
        /// User issuing the command
        #[arg(long)]
        added_by: Option<u64>,
    },
    /// Stop tracking a player for a guild
    Untrack { guild: u64, riot_id: String },
    /// Set the channel a guild receives updates in
    SetChannel { guild: u64, channel: u64 },
    /// Forget a guild and everything it tracks
    RemoveGuild { guild: u64 },
    /// Print a guild's leaderboard
    Leaderboard { guild: u64 },
    /// Refresh every player a guild tracks now
    Refresh { guild: u64 },
}

/// Print the outcome of a user-facing command.
fn report(result: CommandResult<String>) {
    match result {
        Ok(message) => println!("{message}"),
        Err(e) => {
            tracing::warn!(error = %e, "Command failed");
            println!("{}", e.user_message());
        }
    }
}

async fn execute(app: Application, command: Command) -> Result<()> {
    match command {
        Command::Run => app.run().await?,
        Command::Sweep => {
            let summary = sweep_summary(&app.sweep_once().await?);
            println!("{summary}");
        }
        Command::Track {
            guild,
            region,
            riot_id,
            added_by,
        } => report(
            app.tracking()
                .track(GuildId(guild), added_by, &region, &riot_id)
                .await
                .map(|entity| tracked_message(&entity)),
        ),
        Command::Untrack { guild, riot_id } => report(
            app.tracking()
                .untrack(GuildId(guild), &riot_id)
                .await
                .map(|removal| untracked_message(&riot_id, removal)),
        ),
        Command::SetChannel { guild, channel } => report(
            app.tracking()
                .set_update_channel(GuildId(guild), ChannelId(channel))
                .await
                .map(|()| format!("Updates will be posted in channel {channel}")),
        ),
        Command::RemoveGuild { guild } => report(
            app.tracking()
                .remove_guild(GuildId(guild))
                .await
                .map(|r| {
                    format!(
                        "Removed guild {guild}: {} untracked, {} deleted",
                        r.untracked, r.deleted
                    )
                }),
        ),
        Command::Leaderboard { guild } => report(
            app.tracking()
                .leaderboard(GuildId(guild))
                .await
                .map(|entities| leaderboard_lines(&entities).join("\n")),
        ),
        Command::Refresh { guild } => {
            let _claim = app.claim_sweeps()?;
            report(
                app.tracking()
                    .refresh_guild(GuildId(guild))
                    .await
                    .map(|_| refreshed_message().to_string()),
            )
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Determine config path: CLI arg > RANKWATCH_CONFIG env var > default
    let config_path = AppConfig::resolve_path(args.config);
    let config = AppConfig::load(&config_path)?;

    rankwatch_telemetry::init_logging(&config.telemetry.log_filter)?;
    info!("Starting rankwatch v{}", env!("CARGO_PKG_VERSION"));
    info!(config_path = %config_path, "Configuration loaded");

    let app = Application::new(config, &Secrets::from_env()).await?;

    execute(app, args.command.unwrap_or(Command::Run)).await
}
