//! Chat command parsing and execution.
//!
//! Permission checks belong to the host; every command parsed here is
//! executed as-is. Replies go to the caller's [`ChatSink`].

use crate::aggregator::LeaderboardAggregator;
use crate::chat::{ChatLine, ChatSink, ChatSpan};
use crate::render::LeaderboardRenderer;
use playtime_core::{
    ChatColor, ConfigError, NameSource, PlayerId, ResetTime, ResetTimeError, StatsCore,
    UnknownColor,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Command errors reported back to the caller
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    InvalidColor(#[from] UnknownColor),

    #[error("Invalid player UUID: {0}")]
    InvalidPlayerId(String),

    #[error("Invalid time format ({0}). Use HH:MM:SS (UTC)")]
    InvalidResetTime(#[from] ResetTimeError),

    #[error("Failed to save configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type CommandResult<T> = Result<T, CommandError>;

const STATSCONFIG_USAGE: &str =
    "/statsconfig <reload|blacklist|color|dailyresettime|resolve> ...";
const BLACKLIST_USAGE: &str = "/statsconfig blacklist <add|remove> <player> | list";
const COLOR_USAGE: &str = "/statsconfig color <player> [set <COLOR>|reset]";
const RESOLVE_USAGE: &str = "/statsconfig resolve <uuid>";

/// A parsed chat command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `/playtime`
    Playtime,
    Reload,
    BlacklistAdd(String),
    BlacklistRemove(String),
    BlacklistList,
    ColorShow(String),
    ColorSet { player: String, color: ChatColor },
    ColorReset(String),
    DailyResetTimeShow,
    DailyResetTimeSet(ResetTime),
    Resolve(PlayerId),
}

impl Command {
    /// Parses a chat line such as `/statsconfig color Steve set gold`.
    ///
    /// The leading slash is optional.
    pub fn parse(input: &str) -> CommandResult<Self> {
        let input = input.trim();
        let input = input.strip_prefix('/').unwrap_or(input);
        let mut words = input.split_whitespace();

        match words.next().map(str::to_lowercase).as_deref() {
            Some("playtime") => Ok(Command::Playtime),
            Some("statsconfig") => Self::parse_statsconfig(words.collect()),
            Some(other) => Err(CommandError::Unknown(other.to_string())),
            None => Err(CommandError::Unknown(String::new())),
        }
    }

    fn parse_statsconfig(args: Vec<&str>) -> CommandResult<Self> {
        let sub = args.first().map(|s| s.to_lowercase());
        match (sub.as_deref(), &args[args.len().min(1)..]) {
            (Some("reload"), []) => Ok(Command::Reload),
            (Some("blacklist"), rest) => match rest {
                [action, player] if action.eq_ignore_ascii_case("add") => {
                    Ok(Command::BlacklistAdd(player.to_string()))
                }
                [action, player] if action.eq_ignore_ascii_case("remove") => {
                    Ok(Command::BlacklistRemove(player.to_string()))
                }
                [action] if action.eq_ignore_ascii_case("list") => Ok(Command::BlacklistList),
                _ => Err(CommandError::Usage(BLACKLIST_USAGE)),
            },
            (Some("color"), rest) => match rest {
                [player] => Ok(Command::ColorShow(player.to_string())),
                [player, action, color] if action.eq_ignore_ascii_case("set") => {
                    Ok(Command::ColorSet {
                        player: player.to_string(),
                        color: color.parse()?,
                    })
                }
                [player, action] if action.eq_ignore_ascii_case("reset") => {
                    Ok(Command::ColorReset(player.to_string()))
                }
                _ => Err(CommandError::Usage(COLOR_USAGE)),
            },
            (Some("dailyresettime"), []) => Ok(Command::DailyResetTimeShow),
            (Some("dailyresettime"), rest) => {
                let time = ResetTime::parse_configured(&rest.join(" "))?;
                Ok(Command::DailyResetTimeSet(time))
            }
            (Some("resolve"), [raw]) => PlayerId::from_str(raw)
                .map(Command::Resolve)
                .map_err(|_| CommandError::InvalidPlayerId(raw.to_string())),
            (Some("resolve"), _) => Err(CommandError::Usage(RESOLVE_USAGE)),
            _ => Err(CommandError::Usage(STATSCONFIG_USAGE)),
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Human readable origin of a resolved name
struct NameSourceLabel(NameSource);

impl fmt::Display for NameSourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.0 {
            NameSource::Session => "online",
            NameSource::Cache => "cache",
            NameSource::Directory => "profile directory",
            NameSource::Placeholder => "placeholder",
        };
        f.write_str(label)
    }
}

/// Executes commands against a running core
pub struct CommandDispatcher {
    core: Arc<StatsCore>,
}

impl CommandDispatcher {
    pub fn new(core: Arc<StatsCore>) -> Self {
        Self { core }
    }

    /// Parses and executes `input`. Returns true on success.
    pub async fn dispatch(&self, input: &str, sink: &dyn ChatSink) -> bool {
        match Command::parse(input) {
            Ok(command) => self.execute(command, sink).await,
            Err(e) => {
                sink.send(ChatLine::colored(e.to_string(), ChatColor::Red));
                false
            }
        }
    }

    /// Executes `command`, sending replies to `sink`. Returns true on success.
    pub async fn execute(&self, command: Command, sink: &dyn ChatSink) -> bool {
        let label = format!("{:?}", command);
        match self.run(command, sink).await {
            Ok(success) => success,
            Err(e) => {
                error!("Command {} failed: {}", label, e);
                sink.send(ChatLine::colored(e.to_string(), ChatColor::Red));
                false
            }
        }
    }

    async fn run(&self, command: Command, sink: &dyn ChatSink) -> CommandResult<bool> {
        let config = self.core.config();

        match command {
            Command::Playtime => {
                self.show_leaderboard(sink).await;
                Ok(true)
            }
            Command::Reload => match self.core.reload_config().await {
                Ok(()) => {
                    reply(sink, "Successfully reloaded configuration", ChatColor::Green);
                    Ok(true)
                }
                Err(e) => {
                    reply(
                        sink,
                        &format!("Failed to reload configuration: {e}"),
                        ChatColor::Red,
                    );
                    Ok(false)
                }
            },
            Command::BlacklistAdd(player) => {
                if !config.blacklist_add(&player) {
                    reply(sink, &format!("{player} is already blacklisted"), ChatColor::Yellow);
                    return Ok(false);
                }
                config.save().await?;
                info!("Added {} to blacklist", player);
                reply(sink, &format!("Added {player} to blacklist"), ChatColor::Green);
                Ok(true)
            }
            Command::BlacklistRemove(player) => {
                if !config.blacklist_remove(&player) {
                    reply(sink, &format!("{player} is not blacklisted"), ChatColor::Yellow);
                    return Ok(false);
                }
                config.save().await?;
                info!("Removed {} from blacklist", player);
                reply(sink, &format!("Removed {player} from blacklist"), ChatColor::Green);
                Ok(true)
            }
            Command::BlacklistList => {
                let players = config.blacklist();
                if players.is_empty() {
                    reply(sink, "Blacklist is empty", ChatColor::Yellow);
                } else {
                    reply(
                        sink,
                        &format!("Blacklisted players: {}", players.join(", ")),
                        ChatColor::White,
                    );
                }
                Ok(true)
            }
            Command::ColorShow(player) => {
                let color = config.color_of(&player);
                reply(sink, &format!("{player}'s color: {color}"), color);
                Ok(true)
            }
            Command::ColorSet { player, color } => {
                config.set_color(&player, color);
                config.save().await?;
                info!("Set {}'s color to {}", player, color);
                reply(sink, &format!("Set {player}'s color to {color}"), color);
                Ok(true)
            }
            Command::ColorReset(player) => {
                if !config.reset_color(&player) {
                    reply(sink, &format!("{player}'s color is already default"), ChatColor::Yellow);
                    return Ok(false);
                }
                config.save().await?;
                info!("Reset {}'s color", player);
                reply(sink, &format!("Reset {player}'s color to WHITE"), ChatColor::White);
                Ok(true)
            }
            Command::DailyResetTimeShow => {
                let time = self.core.accumulator().reset_time().await;
                reply(sink, &format!("Daily reset time: {time} UTC"), ChatColor::White);
                Ok(true)
            }
            Command::DailyResetTimeSet(time) => {
                self.core.update_reset_time(time).await?;
                info!("Set daily reset time to {} UTC", time);
                reply(
                    sink,
                    &format!("Set daily reset time to {time} UTC"),
                    ChatColor::Green,
                );
                Ok(true)
            }
            Command::Resolve(id) => {
                let resolved = self.core.resolver().resolve_with_source(id).await;
                sink.send(ChatLine::new(vec![
                    ChatSpan::colored(format!("{id}: "), ChatColor::Gray),
                    ChatSpan::colored(resolved.name, ChatColor::White),
                    ChatSpan::colored(
                        format!(" ({})", NameSourceLabel(resolved.source)),
                        ChatColor::DarkGray,
                    ),
                ]));
                Ok(true)
            }
        }
    }

    /// Builds the ranking and sends the rendered board, line by line.
    pub async fn show_leaderboard(&self, sink: &dyn ChatSink) {
        let display = self.core.config().display_settings();
        let ranking = LeaderboardAggregator::from_core(&self.core)
            .build_ranking(&display.blacklisted_players)
            .await;

        for line in LeaderboardRenderer::new(display).render(&ranking) {
            sink.send(line);
        }
    }
}

fn reply(sink: &dyn ChatSink, text: &str, color: ChatColor) {
    sink.send(ChatLine::colored(text, color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_playtime() {
        assert_eq!(Command::parse("/playtime").unwrap(), Command::Playtime);
        assert_eq!(Command::parse("  PlayTime ").unwrap(), Command::Playtime);
    }

    #[test]
    fn test_parse_statsconfig() {
        assert_eq!(Command::parse("/statsconfig reload").unwrap(), Command::Reload);
        assert_eq!(
            Command::parse("/statsconfig blacklist add Grief3r").unwrap(),
            Command::BlacklistAdd("Grief3r".to_string())
        );
        assert_eq!(
            Command::parse("/statsconfig blacklist list").unwrap(),
            Command::BlacklistList
        );
        assert_eq!(
            Command::parse("/statsconfig color Steve set light_purple").unwrap(),
            Command::ColorSet {
                player: "Steve".to_string(),
                color: ChatColor::LightPurple
            }
        );
        assert_eq!(
            Command::parse("/statsconfig color Steve").unwrap(),
            Command::ColorShow("Steve".to_string())
        );
        assert_eq!(
            Command::parse("/statsconfig dailyresettime 04:30:00").unwrap(),
            Command::DailyResetTimeSet(ResetTime::parse("04:30:00").unwrap())
        );
        assert_eq!(
            Command::parse("/statsconfig dailyresettime 04:30:00 UTC").unwrap(),
            Command::DailyResetTimeSet(ResetTime::parse("04:30:00").unwrap())
        );
        assert_eq!(
            Command::parse("/statsconfig dailyresettime").unwrap(),
            Command::DailyResetTimeShow
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Command::parse("/spawn"), Err(CommandError::Unknown(_))));
        assert!(matches!(
            Command::parse("/statsconfig color Steve set rainbow"),
            Err(CommandError::InvalidColor(_))
        ));
        assert!(matches!(
            Command::parse("/statsconfig dailyresettime 25:00:00"),
            Err(CommandError::InvalidResetTime(_))
        ));
        assert!(matches!(
            Command::parse("/statsconfig dailyresettime 6:5:0"),
            Err(CommandError::InvalidResetTime(ResetTimeError::SegmentWidth(_)))
        ));
        assert!(matches!(
            Command::parse("/statsconfig blacklist add"),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            Command::parse("/statsconfig resolve nope"),
            Err(CommandError::InvalidPlayerId(_))
        ));
        assert!(matches!(Command::parse("/statsconfig"), Err(CommandError::Usage(_))));
    }
}
