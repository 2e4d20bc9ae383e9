//! Playtime leaderboard plugin.
//!
//! Serves `/playtime`, a ranked board of lifetime hours with per-day
//! playtime on hover, and the `/statsconfig` admin commands. Player
//! lifecycle events from the host feed the daily accumulator.

pub mod aggregator;
pub mod chat;
pub mod commands;
pub mod render;

pub use aggregator::{LeaderboardAggregator, LeaderboardEntry};
pub use chat::{ChatLine, ChatSink, ChatSpan, CollectingSink};
pub use commands::{Command, CommandDispatcher, CommandError, CommandResult};
pub use render::LeaderboardRenderer;

use async_trait::async_trait;
use playtime_core::{OnlinePlayer, StatsCore};
use std::sync::Arc;
use tracing::info;

/// A plugin driven by player lifecycle events and chat commands
#[async_trait]
pub trait ChatCommandPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Root command names this plugin answers to, without the slash
    fn commands(&self) -> &[&'static str];

    async fn on_player_join(&self, _player: &OnlinePlayer) {}

    /// Called for every connected player on every server tick.
    async fn on_player_tick(&self, _player: &OnlinePlayer, _tick_count: u64) {}

    async fn on_player_leave(&self, _player: &OnlinePlayer) {}

    /// Handles a chat command. Returns true if it succeeded.
    async fn handle_command(&self, input: &str, sink: &dyn ChatSink) -> bool;

    async fn on_shutdown(&self) {}
}

const COMMANDS: &[&str] = &["playtime", "statsconfig"];

/// The leaderboard plugin
pub struct LeaderboardPlugin {
    core: Arc<StatsCore>,
    dispatcher: CommandDispatcher,
}

impl LeaderboardPlugin {
    pub fn new(core: Arc<StatsCore>) -> Self {
        info!("🏆 LeaderboardPlugin: Ready to rank players");
        Self {
            dispatcher: CommandDispatcher::new(core.clone()),
            core,
        }
    }

    pub fn core(&self) -> &Arc<StatsCore> {
        &self.core
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }
}

#[async_trait]
impl ChatCommandPlugin for LeaderboardPlugin {
    fn name(&self) -> &str {
        "playtime_leaderboard"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn commands(&self) -> &[&'static str] {
        COMMANDS
    }

    async fn on_player_join(&self, player: &OnlinePlayer) {
        self.core.on_player_joined(player).await;
    }

    async fn on_player_tick(&self, player: &OnlinePlayer, tick_count: u64) {
        self.core.on_player_tick(player, tick_count).await;
    }

    async fn on_player_leave(&self, player: &OnlinePlayer) {
        self.core.on_player_left(player).await;
    }

    async fn handle_command(&self, input: &str, sink: &dyn ChatSink) -> bool {
        self.dispatcher.dispatch(input, sink).await
    }

    async fn on_shutdown(&self) {
        info!("🏆 LeaderboardPlugin: Shutting down");
        self.core.shutdown().await;
    }
}
