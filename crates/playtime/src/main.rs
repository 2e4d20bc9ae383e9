//! Playtime console.
//!
//! Loads the configuration, starts the playtime services against the
//! world's stat files and serves leaderboard and admin commands from the
//! command line or an interactive console.

mod cli;
mod logging;
mod signals;

use anyhow::Context;
use cli::{Action, CliArgs};
use playtime_core::{ConfigManager, InMemorySessions, StatsCore, SystemClock};
use plugin_playtime_leaderboard::{
    ChatCommandPlugin, ChatLine, ChatSink, LeaderboardAggregator, LeaderboardPlugin,
};
use std::io::IsTerminal;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

/// Console commands that end the session
const STOP_COMMANDS: &[&str] = &["stop", "exit", "quit"];

/// Prints chat lines to stdout, with ANSI styling when attached to a terminal
struct TerminalSink {
    ansi: bool,
}

impl TerminalSink {
    fn new() -> Self {
        Self {
            ansi: std::io::stdout().is_terminal(),
        }
    }
}

impl ChatSink for TerminalSink {
    fn send(&self, line: ChatLine) {
        if self.ansi {
            println!("{}", line.to_ansi());
        } else {
            println!("{}", line.plain_text());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let config = ConfigManager::load(&args.config_path)
        .await
        .with_context(|| format!("loading {}", args.config_path.display()))?;

    let mut logging = config.snapshot().logging;
    if let Some(level) = args.log_level.clone() {
        logging.level = level;
    }
    if args.json_logs {
        logging.json_format = true;
    }
    logging::setup_logging(&logging)?;

    info!("📂 Config: {}", args.config_path.display());

    // No live server is attached, so every player is read from the stat files.
    let sessions = Arc::new(InMemorySessions::new());
    let core = Arc::new(StatsCore::start(Arc::new(config), sessions, Arc::new(SystemClock)).await);
    let plugin = LeaderboardPlugin::new(core.clone());

    let result = run(&args.action, &plugin, &core).await;
    plugin.on_shutdown().await;
    result
}

async fn run(action: &Action, plugin: &LeaderboardPlugin, core: &StatsCore) -> anyhow::Result<()> {
    let sink = TerminalSink::new();

    match action {
        Action::Leaderboard { json: false } => {
            plugin.handle_command("/playtime", &sink).await;
        }
        Action::Leaderboard { json: true } => {
            let display = core.config().display_settings();
            let ranking = LeaderboardAggregator::from_core(core)
                .build_ranking(&display.blacklisted_players)
                .await;
            println!("{}", serde_json::to_string_pretty(&ranking)?);
        }
        Action::Exec(command) => {
            if !plugin.handle_command(command, &sink).await {
                anyhow::bail!("command failed: {}", command);
            }
        }
        Action::Console => console(plugin, &sink).await?,
    }

    Ok(())
}

/// Dispatches stdin lines until EOF, a stop command or a shutdown signal.
async fn console(plugin: &LeaderboardPlugin, sink: &TerminalSink) -> anyhow::Result<()> {
    info!("🎮 Console ready, commands: {}", plugin.commands().join(", "));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let shutdown = signals::wait_for_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                match result {
                    Ok(signal) => info!("📡 Received {} signal, closing console", signal),
                    Err(e) => error!("Signal handling failed: {}", e),
                }
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading console input")? else {
                    break;
                };
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if STOP_COMMANDS.contains(&input.to_lowercase().as_str()) {
                    break;
                }
                plugin.handle_command(input, sink).await;
            }
        }
    }

    info!("🛑 Console closed");
    Ok(())
}
