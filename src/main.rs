use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use alybot::{Config, Daemon};

/// Alybot - Discord chat bot with trigger replies and an airhorn
#[derive(Parser)]
#[command(name = "alybot", version, about)]
struct Cli {
    /// Bot token
    #[arg(short, long, env = "ALYBOT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Pre-encoded sound clip (length-prefixed opus frames)
    #[arg(long, env = "ALYBOT_SOUND")]
    sound: Option<PathBuf>,

    /// Trigger table JSON file
    #[arg(long, env = "ALYBOT_COMMANDS")]
    commands: Option<PathBuf>,

    /// Config file (defaults to ~/.config/alybot/config.toml if present)
    #[arg(short, long, env = "ALYBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,alybot=info",
        1 => "info,alybot=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;

    // CLI > config file > default
    if let Some(token) = cli.token.filter(|t| !t.is_empty()) {
        config.token = Some(token);
    }
    if let Some(sound) = cli.sound {
        config.sound_path = sound;
    }
    if let Some(commands) = cli.commands {
        config.commands_path = commands;
    }

    if config.token.is_none() {
        eprintln!("No token provided. Please run: alybot -t <bot token>");
        anyhow::bail!("missing bot token");
    }

    tracing::info!(
        sound = %config.sound_path.display(),
        commands = %config.commands_path.display(),
        "starting alybot"
    );

    let daemon = Daemon::new(config).await?;
    daemon.run().await?;

    Ok(())
}
