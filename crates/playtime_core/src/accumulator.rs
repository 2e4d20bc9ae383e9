//! Daily playtime accumulation.
//!
//! The accumulator turns absolute host activity counters into per-player
//! daily seconds. Records and the reset scheduler live behind one lock so a
//! reset and the sample that triggered it are observed together.

use crate::clock::Clock;
use crate::error::StorageResult;
use crate::scheduler::{DailyResetScheduler, ResetTime};
use crate::storage::{read_json, write_json_atomic};
use crate::types::{ticks_to_seconds, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Per-player counters owned by the accumulator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaytimeRecord {
    /// Seconds accrued since the last reset boundary
    pub daily_seconds: f64,
    /// Last absolute counter value observed; `None` until anchored
    pub last_sampled_ticks: Option<u64>,
}

/// On-disk shape of the daily state
#[derive(Debug, Serialize, Deserialize)]
struct DailySnapshot {
    #[serde(default)]
    daily_seconds: BTreeMap<String, f64>,
    #[serde(default)]
    last_reset_check: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct TrackerState {
    records: HashMap<PlayerId, PlaytimeRecord>,
    scheduler: DailyResetScheduler,
}

impl TrackerState {
    fn snapshot(&self) -> DailySnapshot {
        DailySnapshot {
            daily_seconds: self
                .records
                .iter()
                .map(|(id, record)| (id.to_string(), record.daily_seconds))
                .collect(),
            last_reset_check: Some(self.scheduler.last_checked()),
        }
    }

    /// Applies one sample and the boundary check. Returns true on reset.
    fn sample(&mut self, id: PlayerId, ticks: u64, ticks_per_second: u32, now: DateTime<Utc>) -> bool {
        let record = self.records.entry(id).or_default();
        let last = record.last_sampled_ticks.unwrap_or(ticks);
        let delta = ticks.saturating_sub(last);
        record.daily_seconds += ticks_to_seconds(delta, ticks_per_second);
        record.last_sampled_ticks = Some(last.max(ticks));

        if self.scheduler.check_and_maybe_reset(now) {
            info!("🌅 Daily reset boundary crossed at {}, clearing daily playtime", now);
            for record in self.records.values_mut() {
                record.daily_seconds = 0.0;
            }
            return true;
        }
        false
    }
}

/// Tracks daily playtime for every player seen since the last reset
pub struct PlaytimeAccumulator {
    path: PathBuf,
    ticks_per_second: u32,
    clock: Arc<dyn Clock>,
    state: RwLock<TrackerState>,
}

impl PlaytimeAccumulator {
    /// Creates an empty accumulator persisting to `path`.
    pub fn new(path: impl Into<PathBuf>, ticks_per_second: u32, clock: Arc<dyn Clock>) -> Self {
        let scheduler = DailyResetScheduler::new(clock.now());
        Self {
            path: path.into(),
            ticks_per_second,
            clock,
            state: RwLock::new(TrackerState {
                records: HashMap::new(),
                scheduler,
            }),
        }
    }

    /// Loads the persisted snapshot.
    ///
    /// A missing or corrupt snapshot starts empty with the last check set to
    /// now. Entries whose key is not a player identifier are skipped.
    pub async fn load(path: impl Into<PathBuf>, ticks_per_second: u32, clock: Arc<dyn Clock>) -> Self {
        let accumulator = Self::new(path, ticks_per_second, clock);

        let snapshot: Option<DailySnapshot> = match read_json(&accumulator.path).await {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                info!(
                    "No daily playtime file at {}, starting fresh",
                    accumulator.path.display()
                );
                None
            }
            Err(e) => {
                error!("Failed to load daily playtime, starting fresh: {}", e);
                None
            }
        };

        if let Some(snapshot) = snapshot {
            let mut state = accumulator.state.write().await;
            for (key, seconds) in snapshot.daily_seconds {
                match PlayerId::from_str(&key) {
                    Ok(id) if seconds.is_finite() && seconds >= 0.0 => {
                        state.records.insert(
                            id,
                            PlaytimeRecord {
                                daily_seconds: seconds,
                                last_sampled_ticks: None,
                            },
                        );
                    }
                    Ok(_) => warn!("Ignoring invalid daily playtime {} for {}", seconds, key),
                    Err(_) => warn!("Invalid UUID in playtime data: {}", key),
                }
            }
            match snapshot.last_reset_check {
                Some(last) => state.scheduler.restore_last_checked(last),
                None => warn!("Daily playtime file has no last_reset_check, using current time"),
            }
            info!(
                "Loaded daily playtime for {} players (last reset check {})",
                state.records.len(),
                state.scheduler.last_checked()
            );
        }

        accumulator
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ticks_per_second(&self) -> u32 {
        self.ticks_per_second
    }

    /// Applies a configured reset time; malformed values fall back to midnight.
    pub async fn set_reset_time(&self, raw: &str) -> ResetTime {
        self.state.write().await.scheduler.set_reset_time(raw)
    }

    pub async fn reset_time(&self) -> ResetTime {
        self.state.read().await.scheduler.reset_time()
    }

    pub async fn last_checked(&self) -> DateTime<Utc> {
        self.state.read().await.scheduler.last_checked()
    }

    /// Anchors the counter for a player who just connected.
    ///
    /// Time spent disconnected is never counted. Existing daily seconds are kept.
    pub async fn on_player_connect(&self, id: PlayerId, activity_ticks: u64) {
        let mut state = self.state.write().await;
        let record = state.records.entry(id).or_default();
        record.last_sampled_ticks = Some(activity_ticks);
        debug!("Anchored {} at {} ticks", id, activity_ticks);
    }

    /// Accrues the time elapsed since the previous sample.
    ///
    /// Returns true when this sample crossed a reset boundary, in which case
    /// every player's daily seconds were zeroed and the snapshot persisted.
    pub async fn on_periodic_sample(&self, id: PlayerId, activity_ticks: u64) -> bool {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        let reset = state.sample(id, activity_ticks, self.ticks_per_second, now);
        if reset {
            self.persist_locked(&state).await;
        }
        reset
    }

    /// Takes a final sample and persists the snapshot.
    pub async fn on_player_disconnect(&self, id: PlayerId, activity_ticks: u64) {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        state.sample(id, activity_ticks, self.ticks_per_second, now);
        if let Some(record) = state.records.get_mut(&id) {
            record.last_sampled_ticks = None;
        }
        self.persist_locked(&state).await;
    }

    /// Daily seconds for `id`; zero when unknown.
    pub async fn get_daily_seconds(&self, id: &PlayerId) -> f64 {
        self.state
            .read()
            .await
            .records
            .get(id)
            .map(|record| record.daily_seconds)
            .unwrap_or(0.0)
    }

    /// Daily seconds of every tracked player.
    pub async fn daily_seconds(&self) -> HashMap<PlayerId, f64> {
        self.state
            .read()
            .await
            .records
            .iter()
            .map(|(id, record)| (*id, record.daily_seconds))
            .collect()
    }

    pub async fn record(&self, id: &PlayerId) -> Option<PlaytimeRecord> {
        self.state.read().await.records.get(id).cloned()
    }

    pub async fn tracked_players(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Writes the snapshot to disk.
    pub async fn persist(&self) -> StorageResult<()> {
        let state = self.state.read().await;
        write_json_atomic(&self.path, &state.snapshot()).await
    }

    async fn persist_locked(&self, state: &TrackerState) {
        if let Err(e) = write_json_atomic(&self.path, &state.snapshot()).await {
            error!("Failed to save daily playtime: {}", e);
        }
    }
}
