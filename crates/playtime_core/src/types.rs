//! # Core Type Definitions
//!
//! Building blocks shared by the tracker, the resolver and the leaderboard.
//!
//! - [`PlayerId`] - stable unique key for a player account
//! - [`OnlinePlayer`] - a connected player as reported by the host session registry
//! - [`StatRecord`] - a persisted activity counter read from the host stat store

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of characters of the canonical identifier kept in placeholder names.
pub const PLACEHOLDER_PREFIX_LEN: usize = 8;

/// Unique identifier for a player account.
///
/// Wraps a UUID so player identifiers cannot be confused with other ids and
/// so the canonical text form used on disk and in placeholders stays in one place.
///
/// # Examples
///
/// ```rust
/// use playtime_core::PlayerId;
///
/// let player_id = PlayerId::from_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
/// assert_eq!(player_id.short(), "550e8400");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random player ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a player ID from its hyphenated or simple text form.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    /// Text form without hyphens, as expected by profile directory services.
    pub fn simple(&self) -> String {
        self.0.simple().to_string()
    }

    /// Short deterministic prefix of the canonical (hyphenated) form.
    pub fn short(&self) -> String {
        self.0
            .hyphenated()
            .to_string()
            .chars()
            .take(PLACEHOLDER_PREFIX_LEN)
            .collect()
    }
}

impl std::str::FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str(s)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A connected player as seen by the host session registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnlinePlayer {
    pub id: PlayerId,
    /// Live display name; authoritative while the session lasts.
    pub name: String,
    /// Absolute activity counter, in host ticks.
    pub activity_ticks: u64,
}

impl OnlinePlayer {
    pub fn new(id: PlayerId, name: impl Into<String>, activity_ticks: u64) -> Self {
        Self {
            id,
            name: name.into(),
            activity_ticks,
        }
    }
}

/// Activity counter persisted by the host for one player, online or not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    pub id: PlayerId,
    pub activity_ticks: u64,
}

/// Converts host ticks to seconds.
pub fn ticks_to_seconds(ticks: u64, ticks_per_second: u32) -> f64 {
    if ticks_per_second == 0 {
        return 0.0;
    }
    ticks as f64 / ticks_per_second as f64
}

/// Converts host ticks to hours.
pub fn ticks_to_hours(ticks: u64, ticks_per_second: u32) -> f64 {
    ticks_to_seconds(ticks, ticks_per_second) / 3600.0
}
