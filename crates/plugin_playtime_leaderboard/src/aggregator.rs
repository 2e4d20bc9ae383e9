//! Builds the ranked playtime list from live sessions and stored stats.

use futures::stream::{self, StreamExt};
use playtime_core::{
    ticks_to_hours, NameResolver, PlayerId, PlaytimeAccumulator, SessionRegistry, StatStore,
    StatsCore,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Upper bound on profile directory lookups in flight during one ranking
pub const MAX_CONCURRENT_LOOKUPS: usize = 4;

/// One row of the leaderboard, rebuilt for every request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub id: PlayerId,
    pub name: String,
    pub lifetime_hours: f64,
    pub daily_hours: f64,
}

/// Merges online and offline playtime into one ranking
pub struct LeaderboardAggregator {
    sessions: Arc<dyn SessionRegistry>,
    stats: Arc<dyn StatStore>,
    resolver: Arc<NameResolver>,
    accumulator: Arc<PlaytimeAccumulator>,
    ticks_per_second: u32,
}

impl LeaderboardAggregator {
    pub fn new(
        sessions: Arc<dyn SessionRegistry>,
        stats: Arc<dyn StatStore>,
        resolver: Arc<NameResolver>,
        accumulator: Arc<PlaytimeAccumulator>,
        ticks_per_second: u32,
    ) -> Self {
        Self {
            sessions,
            stats,
            resolver,
            accumulator,
            ticks_per_second,
        }
    }

    /// Aggregator reading from the collaborators of a running core
    pub fn from_core(core: &StatsCore) -> Self {
        Self::new(
            core.sessions().clone(),
            core.stats().clone(),
            core.resolver().clone(),
            core.accumulator().clone(),
            core.ticks_per_second(),
        )
    }

    /// Ranks every known player by lifetime hours, highest first.
    ///
    /// Connected players come first in discovery order, followed by stored
    /// players in stat store order; ties keep that order. Players whose
    /// resolved name is in `exclusions` (compared lowercase) are dropped.
    pub async fn build_ranking(&self, exclusions: &HashSet<String>) -> Vec<LeaderboardEntry> {
        let online = self.sessions.online_players();
        let online_ids: HashSet<PlayerId> = online.iter().map(|p| p.id).collect();

        let mut entries = Vec::with_capacity(online.len());
        for player in online {
            let daily_seconds = self.accumulator.get_daily_seconds(&player.id).await;
            entries.push(LeaderboardEntry {
                id: player.id,
                name: player.name,
                lifetime_hours: ticks_to_hours(player.activity_ticks, self.ticks_per_second),
                daily_hours: daily_seconds / 3600.0,
            });
        }

        let offline: Vec<_> = self
            .stats
            .records()
            .await
            .into_iter()
            .filter(|record| !online_ids.contains(&record.id))
            .collect();

        // Results come back in stat store order.
        let offline_ids: Vec<PlayerId> = offline.iter().map(|record| record.id).collect();
        let lookups = offline_ids
            .into_iter()
            .map(|id| self.resolver.resolve(id));
        let names: Vec<String> = stream::iter(lookups)
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .collect()
            .await;

        for (record, name) in offline.into_iter().zip(names) {
            let daily_seconds = self.accumulator.get_daily_seconds(&record.id).await;
            entries.push(LeaderboardEntry {
                id: record.id,
                name,
                lifetime_hours: ticks_to_hours(record.activity_ticks, self.ticks_per_second),
                daily_hours: daily_seconds / 3600.0,
            });
        }

        entries.retain(|entry| {
            let excluded = exclusions.contains(&entry.name.to_lowercase());
            if excluded {
                debug!("Hiding blacklisted player {}", entry.name);
            }
            !excluded
        });

        entries.sort_by(|a, b| b.lifetime_hours.total_cmp(&a.lifetime_hours));
        entries
    }
}
