//! Daily reset boundary detection.
//!
//! The scheduler owns the configured reset time of day (always UTC) and the
//! instant of the last boundary check. A reset is signalled when the most
//! recent boundary at or before `now` lies after the last check, which fires
//! at most once per crossed boundary and never skips one, however sparse the
//! checks are.

use crate::error::ResetTimeError;
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{error, info, warn};

/// Suffix accepted on reset times written by older configurations.
const LEGACY_UTC_SUFFIX: &str = " UTC";

/// A time of day in `HH:MM:SS`, interpreted in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResetTime {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl ResetTime {
    pub const MIDNIGHT: ResetTime = ResetTime {
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// Parses a strict `HH:MM:SS` value.
    pub fn parse(raw: &str) -> Result<Self, ResetTimeError> {
        let segments: Vec<&str> = raw.trim().split(':').collect();
        if segments.len() != 3 {
            return Err(ResetTimeError::SegmentCount(segments.len()));
        }

        let mut values = [0u32; 3];
        for (value, segment) in values.iter_mut().zip(&segments) {
            if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_digit()) {
                return Err(ResetTimeError::NotNumeric(segment.to_string()));
            }
            if segment.len() != 2 {
                return Err(ResetTimeError::SegmentWidth(segment.to_string()));
            }
            *value = segment
                .parse()
                .map_err(|_| ResetTimeError::NotNumeric(segment.to_string()))?;
        }

        let [hour, minute, second] = values;
        if hour > 23 {
            return Err(ResetTimeError::OutOfRange { field: "hour", value: hour });
        }
        if minute > 59 {
            return Err(ResetTimeError::OutOfRange { field: "minute", value: minute });
        }
        if second > 59 {
            return Err(ResetTimeError::OutOfRange { field: "second", value: second });
        }

        Ok(Self { hour, minute, second })
    }

    /// Parses a configured value, accepting the legacy `HH:MM:SS UTC` form.
    pub fn parse_configured(raw: &str) -> Result<Self, ResetTimeError> {
        let trimmed = raw.trim();
        match trimmed.strip_suffix(LEGACY_UTC_SUFFIX) {
            Some(stripped) => {
                warn!(
                    "daily_reset_time '{}' uses the legacy 'HH:MM:SS UTC' format; times are always UTC, write '{}' instead",
                    trimmed, stripped
                );
                Self::parse(stripped)
            }
            None => Self::parse(trimmed),
        }
    }

    fn as_naive(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, self.second).unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for ResetTime {
    type Err = ResetTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ResetTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// Detects daily reset boundary crossings
#[derive(Debug, Clone)]
pub struct DailyResetScheduler {
    reset_time: ResetTime,
    last_checked: DateTime<Utc>,
}

impl DailyResetScheduler {
    /// Creates a scheduler resetting at midnight UTC, last checked at `last_checked`
    pub fn new(last_checked: DateTime<Utc>) -> Self {
        Self {
            reset_time: ResetTime::MIDNIGHT,
            last_checked,
        }
    }

    pub fn reset_time(&self) -> ResetTime {
        self.reset_time
    }

    pub fn last_checked(&self) -> DateTime<Utc> {
        self.last_checked
    }

    /// Replaces the last check instant, e.g. from a persisted snapshot.
    pub fn restore_last_checked(&mut self, last_checked: DateTime<Utc>) {
        self.last_checked = last_checked;
    }

    /// Applies a configured reset time.
    ///
    /// Malformed values are logged and replaced by `00:00:00`; the scheduler
    /// is always left in a valid state. Returns the reset time now in effect.
    pub fn set_reset_time(&mut self, raw: &str) -> ResetTime {
        self.reset_time = match ResetTime::parse_configured(raw) {
            Ok(time) => {
                info!("Set daily reset time to {} UTC", time);
                time
            }
            Err(e) => {
                error!(
                    "Invalid daily_reset_time '{}': {}. Defaulting to {} UTC",
                    raw,
                    e,
                    ResetTime::MIDNIGHT
                );
                ResetTime::MIDNIGHT
            }
        };
        self.reset_time
    }

    /// The most recent reset boundary at or before `now`.
    pub fn latest_boundary(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = Utc.from_utc_datetime(&now.date_naive().and_time(self.reset_time.as_naive()));
        if now >= today {
            today
        } else {
            today - Duration::days(1)
        }
    }

    /// Returns true when a reset boundary was crossed since the last check.
    ///
    /// The last check instant is advanced to `now` unless the clock moved
    /// backwards, in which case it is left where it was.
    pub fn check_and_maybe_reset(&mut self, now: DateTime<Utc>) -> bool {
        let boundary = self.latest_boundary(now);
        let crossed = self.last_checked < boundary;
        if now > self.last_checked {
            self.last_checked = now;
        }
        crossed
    }
}
