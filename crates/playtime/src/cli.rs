//! Command-line interface for the playtime console.

use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = "playtime.toml";

/// What the binary does once the services are up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print the board once, styled or as JSON
    Leaderboard { json: bool },
    /// Run one chat command, e.g. `statsconfig blacklist list`
    Exec(String),
    /// Read chat commands from stdin until EOF, `stop` or a shutdown signal
    Console,
}

/// Parsed command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    pub config_path: PathBuf,
    /// Overrides the configured log level
    pub log_level: Option<String>,
    pub json_logs: bool,
    pub action: Action,
}

/// Builds the clap command tree.
pub fn command() -> Command {
    Command::new("playtime")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Daily and lifetime playtime leaderboard")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value(DEFAULT_CONFIG)
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
                .global(true),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("leaderboard")
                .about("Print the playtime leaderboard")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print ranked entries as JSON")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("exec")
                .about("Run a single chat command")
                .arg(
                    Arg::new("command")
                        .value_name("COMMAND")
                        .help("Command words, e.g. statsconfig color Steve set gold")
                        .required(true)
                        .num_args(1..),
                ),
        )
        .subcommand(Command::new("console").about("Read chat commands from stdin"))
}

impl CliArgs {
    /// Parses the process arguments, exiting with usage on error.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    pub fn from_matches(matches: &ArgMatches) -> Self {
        let action = match matches.subcommand() {
            Some(("exec", sub)) => {
                let words: Vec<String> = sub
                    .get_many::<String>("command")
                    .map(|words| words.cloned().collect())
                    .unwrap_or_default();
                Action::Exec(words.join(" "))
            }
            Some(("console", _)) => Action::Console,
            Some(("leaderboard", sub)) => Action::Leaderboard {
                json: sub.get_flag("json"),
            },
            _ => Action::Leaderboard { json: false },
        };

        Self {
            config_path: PathBuf::from(
                matches
                    .get_one::<String>("config")
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_CONFIG),
            ),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::from_matches(&command().try_get_matches_from(args).unwrap())
    }

    #[test]
    fn test_defaults_to_leaderboard() {
        let args = parse(&["playtime"]);
        assert_eq!(args.config_path, PathBuf::from("playtime.toml"));
        assert_eq!(args.action, Action::Leaderboard { json: false });
        assert!(!args.json_logs);
    }

    #[test]
    fn test_exec_joins_words() {
        let args = parse(&["playtime", "exec", "statsconfig", "color", "Steve", "set", "gold"]);
        assert_eq!(
            args.action,
            Action::Exec("statsconfig color Steve set gold".to_string())
        );
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = parse(&["playtime", "leaderboard", "--json", "-c", "server/playtime.toml"]);
        assert_eq!(args.action, Action::Leaderboard { json: true });
        assert_eq!(args.config_path, PathBuf::from("server/playtime.toml"));
    }
}
