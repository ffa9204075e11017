//! Duration value object

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Default maximum recording duration before auto-stop (5 minutes)
pub const DEFAULT_MAX_DURATION_SECS: u64 = 300;

/// Value object representing a time duration.
/// Immutable and validated on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    milliseconds: u64,
}

impl Duration {
    /// Create a Duration from milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    /// Create a Duration from seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs * 1000,
        }
    }

    /// Default maximum recording duration (5 minutes)
    pub const fn default_max_duration() -> Self {
        Self::from_secs(DEFAULT_MAX_DURATION_SECS)
    }

    /// Get duration in seconds
    pub const fn as_secs(&self) -> u64 {
        self.milliseconds / 1000
    }

    /// Get duration in milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    /// Convert to std::time::Duration
    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.milliseconds)
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Parse a duration string into a Duration value object.
    /// Supported formats: "30s", "5m", "2m30s", "90s"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || DurationParseError {
            input: s.to_string(),
        };

        let input = s.trim().to_lowercase();

        let (minute_part, second_part) = match input.split_once('m') {
            Some((minutes, rest)) => (Some(minutes), rest),
            None => (None, input.as_str()),
        };

        let minutes: u64 = match minute_part {
            Some(digits) if !digits.is_empty() => digits.parse().map_err(|_| err())?,
            Some(_) => return Err(err()),
            None => 0,
        };

        let seconds: u64 = match second_part.strip_suffix('s') {
            Some(digits) if !digits.is_empty() => digits.parse().map_err(|_| err())?,
            Some(_) => return Err(err()),
            None if second_part.is_empty() && minute_part.is_some() => 0,
            None => return Err(err()),
        };

        let total_ms = (minutes * 60 + seconds) * 1000;
        if total_ms == 0 {
            return Err(err());
        }

        Ok(Self {
            milliseconds: total_ms,
        })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;

        if minutes == 0 {
            write!(f, "{}s", seconds)
        } else if seconds == 0 {
            write!(f, "{}m", minutes)
        } else {
            write!(f, "{}m{}s", minutes, seconds)
        }
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::default_max_duration()
    }
}
