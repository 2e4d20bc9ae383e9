//! The [`StatsCore`] service wiring configuration, tracking and name
//! resolution together.
//!
//! Hosts construct one `StatsCore` at startup, forward player ticks and
//! connect/disconnect events to it, and call [`StatsCore::shutdown`] before
//! exiting so the daily snapshot and the identity cache reach disk.

use crate::accumulator::PlaytimeAccumulator;
use crate::clock::Clock;
use crate::config::{ConfigManager, PlaytimeConfig};
use crate::directory::{DirectoryService, HttpDirectory};
use crate::error::ConfigResult;
use crate::identity_cache::IdentityCache;
use crate::resolver::NameResolver;
use crate::scheduler::ResetTime;
use crate::session::SessionRegistry;
use crate::stat_store::{JsonStatStore, StatStore};
use crate::types::OnlinePlayer;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Builds the configured remote directory client, if enabled.
pub fn directory_from_config(config: &PlaytimeConfig) -> Option<Arc<dyn DirectoryService>> {
    if !config.directory.enabled {
        info!("Profile directory lookups disabled");
        return None;
    }

    match HttpDirectory::new(config.directory.base_url.clone(), config.directory.timeout()) {
        Ok(directory) => Some(Arc::new(directory)),
        Err(e) => {
            warn!("Profile directory unavailable, names resolve offline only: {}", e);
            None
        }
    }
}

/// Playtime tracking services with a startup/shutdown lifecycle
pub struct StatsCore {
    config: Arc<ConfigManager>,
    sessions: Arc<dyn SessionRegistry>,
    stats: Arc<dyn StatStore>,
    cache: Arc<IdentityCache>,
    accumulator: Arc<PlaytimeAccumulator>,
    resolver: Arc<NameResolver>,
    sample_interval_ticks: u64,
}

impl StatsCore {
    /// Starts the services using the stat files and directory named in the configuration.
    pub async fn start(
        config: Arc<ConfigManager>,
        sessions: Arc<dyn SessionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let snapshot = config.snapshot();
        let stats: Arc<dyn StatStore> = Arc::new(JsonStatStore::new(snapshot.storage.stats_path()));
        let directory = directory_from_config(&snapshot);
        Self::start_with(config, sessions, stats, directory, clock).await
    }

    /// Starts the services with explicit collaborators.
    ///
    /// Loads the identity cache and the daily snapshot and applies the
    /// configured reset time. Missing or corrupt files start empty.
    pub async fn start_with(
        config: Arc<ConfigManager>,
        sessions: Arc<dyn SessionRegistry>,
        stats: Arc<dyn StatStore>,
        directory: Option<Arc<dyn DirectoryService>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let snapshot = config.snapshot();

        let cache = Arc::new(IdentityCache::load(snapshot.storage.identity_cache_path()).await);
        let accumulator = Arc::new(
            PlaytimeAccumulator::load(
                snapshot.storage.daily_state_path(),
                snapshot.tracker.ticks_per_second,
                clock,
            )
            .await,
        );
        accumulator
            .set_reset_time(&snapshot.tracker.daily_reset_time)
            .await;

        let resolver = Arc::new(NameResolver::new(
            sessions.clone(),
            cache.clone(),
            directory,
            snapshot.directory.timeout(),
        ));

        info!(
            "📊 Playtime services started ({} cached names, {} tracked players)",
            cache.len().await,
            accumulator.tracked_players().await
        );

        Self {
            config,
            sessions,
            stats,
            cache,
            accumulator,
            resolver,
            sample_interval_ticks: snapshot.tracker.sample_interval_ticks.max(1),
        }
    }

    pub fn config(&self) -> &Arc<ConfigManager> {
        &self.config
    }

    pub fn sessions(&self) -> &Arc<dyn SessionRegistry> {
        &self.sessions
    }

    pub fn stats(&self) -> &Arc<dyn StatStore> {
        &self.stats
    }

    pub fn cache(&self) -> &Arc<IdentityCache> {
        &self.cache
    }

    pub fn accumulator(&self) -> &Arc<PlaytimeAccumulator> {
        &self.accumulator
    }

    pub fn resolver(&self) -> &Arc<NameResolver> {
        &self.resolver
    }

    pub fn ticks_per_second(&self) -> u32 {
        self.accumulator.ticks_per_second()
    }

    /// Per-player tick from the host. Samples every `sample_interval_ticks`.
    ///
    /// Returns true if a sample was taken.
    pub async fn on_player_tick(&self, player: &OnlinePlayer, tick_count: u64) -> bool {
        if tick_count % self.sample_interval_ticks != 0 {
            return false;
        }
        self.accumulator
            .on_periodic_sample(player.id, player.activity_ticks)
            .await;
        true
    }

    /// A player logged in: anchor their counter and remember their name.
    pub async fn on_player_joined(&self, player: &OnlinePlayer) {
        self.accumulator
            .on_player_connect(player.id, player.activity_ticks)
            .await;
        self.cache.store(player.id, &player.name).await;
        debug!("{} ({}) joined", player.name, player.id);
    }

    /// A player logged out: take the final sample and persist.
    pub async fn on_player_left(&self, player: &OnlinePlayer) {
        self.accumulator
            .on_player_disconnect(player.id, player.activity_ticks)
            .await;
        debug!("{} ({}) left", player.name, player.id);
    }

    /// Re-reads the configuration file and re-applies the reset time.
    ///
    /// The reset time is applied even when the reload fails, since a failed
    /// reload falls back to the defaults.
    pub async fn reload_config(&self) -> ConfigResult<()> {
        let result = self.config.reload().await;
        self.accumulator
            .set_reset_time(&self.config.daily_reset_time())
            .await;
        result
    }

    /// Stores a new reset time in the configuration and applies it.
    pub async fn update_reset_time(&self, time: ResetTime) -> ConfigResult<()> {
        self.config.set_daily_reset_time(time);
        self.accumulator.set_reset_time(&time.to_string()).await;
        self.config.save().await
    }

    /// Persists the daily snapshot and the identity cache.
    pub async fn shutdown(&self) {
        if let Err(e) = self.accumulator.persist().await {
            error!("Failed to save daily playtime on shutdown: {}", e);
        }
        if let Err(e) = self.cache.save().await {
            error!("Failed to save username cache on shutdown: {}", e);
        }
        info!("📊 Playtime services stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::session::InMemorySessions;
    use crate::stat_store::InMemoryStatStore;
    use crate::types::PlayerId;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    async fn core(dir: &TempDir, sessions: Arc<InMemorySessions>) -> StatsCore {
        let mut config = PlaytimeConfig::default();
        config.storage.world_dir = dir.path().to_string_lossy().into_owned();
        config.tracker.daily_reset_time = "05:00:00".to_string();
        let manager = Arc::new(ConfigManager::new(dir.path().join("playtime.toml"), config));
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()));
        StatsCore::start_with(
            manager,
            sessions,
            Arc::new(InMemoryStatStore::new()),
            None,
            clock,
        )
        .await
    }

    #[tokio::test]
    async fn test_start_applies_reset_time() {
        let dir = TempDir::new().unwrap();
        let core = core(&dir, Arc::new(InMemorySessions::new())).await;
        assert_eq!(core.accumulator().reset_time().await.to_string(), "05:00:00");
    }

    #[tokio::test]
    async fn test_tick_gating_and_lifecycle() {
        let dir = TempDir::new().unwrap();
        let sessions = Arc::new(InMemorySessions::new());
        let core = core(&dir, sessions.clone()).await;
        let mut player = OnlinePlayer::new(PlayerId::new(), "Alex", 1_000);

        sessions.upsert(player.clone());
        core.on_player_joined(&player).await;
        assert_eq!(core.cache().get(&player.id).await.as_deref(), Some("Alex"));

        player.activity_ticks = 1_100;
        assert!(!core.on_player_tick(&player, 99).await);
        assert_eq!(core.accumulator().get_daily_seconds(&player.id).await, 0.0);
        assert!(core.on_player_tick(&player, 100).await);
        assert_eq!(core.accumulator().get_daily_seconds(&player.id).await, 5.0);

        player.activity_ticks = 1_300;
        core.on_player_left(&player).await;
        assert_eq!(core.accumulator().get_daily_seconds(&player.id).await, 15.0);
        assert!(dir.path().join("playtime_daily.json").exists());

        core.shutdown().await;
        assert!(dir.path().join("playtime_usernames.json").exists());
    }

    #[tokio::test]
    async fn test_update_reset_time_saves_config() {
        let dir = TempDir::new().unwrap();
        let core = core(&dir, Arc::new(InMemorySessions::new())).await;

        core.update_reset_time(ResetTime::parse("07:30:00").unwrap())
            .await
            .unwrap();
        assert_eq!(core.accumulator().reset_time().await.to_string(), "07:30:00");

        let saved = PlaytimeConfig::load_from_file(&dir.path().join("playtime.toml"))
            .await
            .unwrap();
        assert_eq!(saved.tracker.daily_reset_time, "07:30:00");
    }
}
