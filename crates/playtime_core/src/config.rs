//! Configuration management for the playtime services.
//!
//! Settings live in one TOML file which is created with defaults on first
//! start. [`ConfigManager`] owns the file at runtime: it reloads it on
//! request and persists the changes made through the admin commands.

use crate::color::ChatColor;
use crate::directory::DEFAULT_DIRECTORY_URL;
use crate::error::{ConfigError, ConfigResult};
use crate::scheduler::ResetTime;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

/// Default daily reset time, UTC
pub const DEFAULT_RESET_TIME: &str = "00:00:00";

/// Playtime configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaytimeConfig {
    #[serde(default)]
    pub tracker: TrackerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub directory: DirectorySettings,
    #[serde(default)]
    pub leaderboard: LeaderboardSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Sampling and reset settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Reset time of day in `HH:MM:SS`, always UTC
    pub daily_reset_time: String,
    /// Host simulation rate used to convert activity ticks to seconds
    pub ticks_per_second: u32,
    /// A connected player is sampled when their tick count is a multiple of this
    pub sample_interval_ticks: u64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            daily_reset_time: DEFAULT_RESET_TIME.to_string(),
            ticks_per_second: 20,
            sample_interval_ticks: 100,
        }
    }
}

/// File locations. Relative paths are resolved against `world_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub world_dir: String,
    pub stats_dir: String,
    pub daily_state_file: String,
    pub identity_cache_file: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            world_dir: "world".to_string(),
            stats_dir: "stats".to_string(),
            daily_state_file: "playtime_daily.json".to_string(),
            identity_cache_file: "playtime_usernames.json".to_string(),
        }
    }
}

impl StorageSettings {
    pub fn world_path(&self) -> PathBuf {
        PathBuf::from(&self.world_dir)
    }

    pub fn stats_path(&self) -> PathBuf {
        self.world_path().join(&self.stats_dir)
    }

    pub fn daily_state_path(&self) -> PathBuf {
        self.world_path().join(&self.daily_state_file)
    }

    pub fn identity_cache_path(&self) -> PathBuf {
        self.world_path().join(&self.identity_cache_file)
    }
}

/// Remote profile directory settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySettings {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_DIRECTORY_URL.to_string(),
            timeout_ms: 5000,
        }
    }
}

impl DirectorySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Leaderboard display settings. Player names are stored lowercase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardSettings {
    /// Lowercase names hidden from the leaderboard
    pub blacklisted_players: BTreeSet<String>,
    /// Lowercase player name to color token
    pub username_colors: BTreeMap<String, String>,
}

impl LeaderboardSettings {
    /// Lowercases names and drops entries whose color is not a chat color.
    pub fn normalize(&mut self) {
        let mut colors = BTreeMap::new();
        for (name, token) in std::mem::take(&mut self.username_colors) {
            let name = name.to_lowercase();
            match ChatColor::from_name(&token) {
                Some(color) => {
                    colors.insert(name, color.name().to_string());
                }
                None => warn!("Invalid color for {}: {}", name, token),
            }
        }
        self.username_colors = colors;

        self.blacklisted_players = std::mem::take(&mut self.blacklisted_players)
            .into_iter()
            .map(|name| name.to_lowercase())
            .collect();
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Username colors and exclusions as consumed by the leaderboard
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplaySettings {
    pub username_colors: HashMap<String, ChatColor>,
    pub blacklisted_players: HashSet<String>,
}

impl DisplaySettings {
    /// Configured color for `name`, white when unset.
    pub fn color_for(&self, name: &str) -> ChatColor {
        self.username_colors
            .get(&name.to_lowercase())
            .copied()
            .unwrap_or(ChatColor::White)
    }

    pub fn is_blacklisted(&self, name: &str) -> bool {
        self.blacklisted_players.contains(&name.to_lowercase())
    }
}

impl PlaytimeConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, a default configuration file is created at
    /// the specified path and the defaults are returned.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The loaded or default configuration, with player names normalized.
    pub async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
            let mut config: PlaytimeConfig =
                toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
            config.leaderboard.normalize();
            Ok(config)
        } else {
            let default_config = PlaytimeConfig::default();
            default_config.write_to(path).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Writes the configuration through a temp file and an atomic rename.
    pub async fn write_to(&self, path: &Path) -> ConfigResult<()> {
        let toml_content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::Write(parent.to_path_buf(), e))?;
        }

        let temp_path = path.with_extension("toml.tmp");
        tokio::fs::write(&temp_path, toml_content)
            .await
            .map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| ConfigError::Write(path.to_path_buf(), e))
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// A malformed reset time is not a validation error: it is recovered at
    /// apply time by falling back to midnight.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        if self.tracker.ticks_per_second == 0 {
            return Err("ticks_per_second must be greater than zero".to_string());
        }
        if self.tracker.sample_interval_ticks == 0 {
            return Err("sample_interval_ticks must be greater than zero".to_string());
        }

        let storage = &self.storage;
        for (key, value) in [
            ("world_dir", &storage.world_dir),
            ("stats_dir", &storage.stats_dir),
            ("daily_state_file", &storage.daily_state_file),
            ("identity_cache_file", &storage.identity_cache_file),
        ] {
            if value.trim().is_empty() {
                return Err(format!("Storage path {key} cannot be empty"));
            }
        }

        if self.directory.enabled {
            if self.directory.base_url.trim().is_empty() {
                return Err("Directory base_url cannot be empty when enabled".to_string());
            }
            if self.directory.timeout_ms == 0 {
                return Err("Directory timeout_ms must be greater than zero".to_string());
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }

    /// Leaderboard colors and exclusions in lookup form.
    pub fn display_settings(&self) -> DisplaySettings {
        DisplaySettings {
            username_colors: self
                .leaderboard
                .username_colors
                .iter()
                .filter_map(|(name, token)| ChatColor::from_name(token).map(|c| (name.clone(), c)))
                .collect(),
            blacklisted_players: self.leaderboard.blacklisted_players.iter().cloned().collect(),
        }
    }
}

/// Owns the configuration file for the lifetime of the services
#[derive(Debug)]
pub struct ConfigManager {
    path: PathBuf,
    config: RwLock<PlaytimeConfig>,
}

impl ConfigManager {
    /// Wraps an already loaded configuration
    pub fn new(path: impl Into<PathBuf>, config: PlaytimeConfig) -> Self {
        Self {
            path: path.into(),
            config: RwLock::new(config),
        }
    }

    /// Loads (or creates) the file at `path` and validates it.
    pub async fn load(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();
        let config = PlaytimeConfig::load_from_file(&path).await?;
        config.validate().map_err(ConfigError::Invalid)?;
        info!(
            "Loaded configuration with {} username colors and {} blacklisted players",
            config.leaderboard.username_colors.len(),
            config.leaderboard.blacklisted_players.len()
        );
        Ok(Self::new(path, config))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A copy of the current configuration
    pub fn snapshot(&self) -> PlaytimeConfig {
        self.config.read().clone()
    }

    pub fn display_settings(&self) -> DisplaySettings {
        self.config.read().display_settings()
    }

    /// Re-reads the reset time and leaderboard settings from disk.
    ///
    /// On failure both are reset to their defaults and the error is returned.
    /// Storage, directory and logging settings only take effect on restart.
    pub async fn reload(&self) -> ConfigResult<()> {
        let loaded = PlaytimeConfig::load_from_file(&self.path)
            .await
            .and_then(|config| config.validate().map(|_| config).map_err(ConfigError::Invalid));

        let mut current = self.config.write();
        match loaded {
            Ok(config) => {
                current.tracker.daily_reset_time = config.tracker.daily_reset_time;
                current.leaderboard = config.leaderboard;
                info!("Successfully reloaded {}", self.path.display());
                Ok(())
            }
            Err(e) => {
                error!("Failed to reload {}: {}", self.path.display(), e);
                warn!("Resetting to default configuration");
                current.tracker.daily_reset_time = DEFAULT_RESET_TIME.to_string();
                current.leaderboard = LeaderboardSettings::default();
                Err(e)
            }
        }
    }

    /// Persists the current configuration.
    pub async fn save(&self) -> ConfigResult<()> {
        let config = self.snapshot();
        config.write_to(&self.path).await
    }

    pub fn daily_reset_time(&self) -> String {
        self.config.read().tracker.daily_reset_time.clone()
    }

    pub fn set_daily_reset_time(&self, time: ResetTime) {
        self.config.write().tracker.daily_reset_time = time.to_string();
    }

    /// Lowercase blacklisted names, sorted
    pub fn blacklist(&self) -> Vec<String> {
        self.config
            .read()
            .leaderboard
            .blacklisted_players
            .iter()
            .cloned()
            .collect()
    }

    /// Returns false if the player was already blacklisted.
    pub fn blacklist_add(&self, player: &str) -> bool {
        self.config
            .write()
            .leaderboard
            .blacklisted_players
            .insert(player.to_lowercase())
    }

    /// Returns false if the player was not blacklisted.
    pub fn blacklist_remove(&self, player: &str) -> bool {
        self.config
            .write()
            .leaderboard
            .blacklisted_players
            .remove(&player.to_lowercase())
    }

    pub fn color_of(&self, player: &str) -> ChatColor {
        self.config
            .read()
            .leaderboard
            .username_colors
            .get(&player.to_lowercase())
            .and_then(|token| ChatColor::from_name(token))
            .unwrap_or(ChatColor::White)
    }

    pub fn set_color(&self, player: &str, color: ChatColor) {
        self.config
            .write()
            .leaderboard
            .username_colors
            .insert(player.to_lowercase(), color.name().to_string());
    }

    /// Returns false if the player had no custom color.
    pub fn reset_color(&self, player: &str) -> bool {
        self.config
            .write()
            .leaderboard
            .username_colors
            .remove(&player.to_lowercase())
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = PlaytimeConfig::default();
        assert_eq!(config.tracker.daily_reset_time, "00:00:00");
        assert_eq!(config.tracker.ticks_per_second, 20);
        assert_eq!(config.tracker.sample_interval_ticks, 100);
        assert_eq!(config.directory.base_url, DEFAULT_DIRECTORY_URL);
        assert_eq!(config.directory.timeout_ms, 5000);
        assert_eq!(
            config.storage.daily_state_path(),
            PathBuf::from("world").join("playtime_daily.json")
        );
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("playtime.toml");

        let config = PlaytimeConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config, PlaytimeConfig::default());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_load_normalizes_names_and_skips_bad_colors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("playtime.toml");
        let toml_content = r#"
[tracker]
daily_reset_time = "04:00:00 UTC"

[leaderboard]
blacklisted_players = ["Grief3r", "grief3r", "AFKBot"]

[leaderboard.username_colors]
Notch = "gold"
Steve = "rainbow"
"#;
        tokio::fs::write(&path, toml_content).await.unwrap();

        let config = PlaytimeConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.tracker.daily_reset_time, "04:00:00 UTC");
        assert_eq!(config.tracker.ticks_per_second, 20);
        assert_eq!(
            config.leaderboard.blacklisted_players.iter().collect::<Vec<_>>(),
            vec!["afkbot", "grief3r"]
        );
        assert_eq!(config.leaderboard.username_colors.len(), 1);
        assert_eq!(config.leaderboard.username_colors["notch"], "GOLD");

        let display = config.display_settings();
        assert_eq!(display.color_for("NOTCH"), ChatColor::Gold);
        assert_eq!(display.color_for("steve"), ChatColor::White);
        assert!(display.is_blacklisted("Grief3R"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PlaytimeConfig::default();
        config.tracker.sample_interval_ticks = 0;
        assert!(config.validate().is_err());

        let mut config = PlaytimeConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = PlaytimeConfig::default();
        config.storage.stats_dir = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = PlaytimeConfig::default();
        config.directory.timeout_ms = 0;
        assert!(config.validate().is_err());
        config.directory.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_mutations_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("playtime.toml");
        let manager = ConfigManager::load(&path).await.unwrap();

        assert!(manager.blacklist_add("Grief3r"));
        assert!(!manager.blacklist_add("GRIEF3R"));
        manager.set_color("Notch", ChatColor::Aqua);
        manager.set_daily_reset_time(ResetTime::parse("06:00:00").unwrap());
        manager.save().await.unwrap();

        let reloaded = ConfigManager::load(&path).await.unwrap();
        assert_eq!(reloaded.blacklist(), vec!["grief3r".to_string()]);
        assert_eq!(reloaded.color_of("notch"), ChatColor::Aqua);
        assert_eq!(reloaded.daily_reset_time(), "06:00:00");

        assert!(reloaded.reset_color("NOTCH"));
        assert!(!reloaded.reset_color("notch"));
        assert!(reloaded.blacklist_remove("grief3r"));
        assert!(reloaded.blacklist().is_empty());
    }

    #[tokio::test]
    async fn test_failed_reload_resets_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("playtime.toml");
        let manager = ConfigManager::load(&path).await.unwrap();
        manager.blacklist_add("someone");
        manager.set_daily_reset_time(ResetTime::parse("12:00:00").unwrap());

        tokio::fs::write(&path, "[tracker\nbroken").await.unwrap();
        assert!(manager.reload().await.is_err());
        assert!(manager.blacklist().is_empty());
        assert_eq!(manager.daily_reset_time(), DEFAULT_RESET_TIME);
    }
}
