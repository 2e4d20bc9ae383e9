//! Playtime Core - daily and lifetime playtime tracking
//!
//! Provides the services a game server needs to run a playtime leaderboard:
//! - Daily accumulation with a configurable UTC reset boundary
//! - Durable identity cache of player names
//! - Cascading name resolution (session, cache, remote directory, placeholder)
//! - Access to the host's per-player stat files
//! - TOML configuration with runtime reload and admin mutations

pub mod accumulator;
pub mod clock;
pub mod color;
pub mod config;
pub mod directory;
pub mod error;
pub mod identity_cache;
pub mod resolver;
pub mod scheduler;
pub mod service;
pub mod session;
pub mod stat_store;
pub mod storage;
pub mod types;

// Re-export the types hosts and plugins use directly
pub use accumulator::{PlaytimeAccumulator, PlaytimeRecord};
pub use clock::{Clock, ManualClock, SystemClock};
pub use color::{ChatColor, UnknownColor};
pub use config::{ConfigManager, DisplaySettings, PlaytimeConfig};
pub use directory::{DirectoryService, HttpDirectory, DEFAULT_DIRECTORY_URL};
pub use error::*;
pub use identity_cache::IdentityCache;
pub use resolver::{placeholder_name, NameResolver, NameSource, ResolvedName};
pub use scheduler::{DailyResetScheduler, ResetTime};
pub use service::StatsCore;
pub use session::{InMemorySessions, SessionRegistry};
pub use stat_store::{InMemoryStatStore, JsonStatStore, StatStore};
pub use types::*;
