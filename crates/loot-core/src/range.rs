//! Named time ranges and how they map onto a retention policy.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::reader::StartMode;
use crate::window::RetentionPolicy;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("unknown time range: {0}")]
    UnknownPreset(String),
    #[error("window length must be a positive number of minutes that fits in a date range, got {0}")]
    InvalidMinutes(i64),
}

/// The window a session aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    /// Sliding window behind the newest event.
    Trailing { minutes: i64 },
    /// From one hour before the session started.
    LastHour,
    /// From local midnight.
    Today,
    /// From midnight of the most recent Monday.
    ThisWeek,
    /// Everything in the file.
    AllTime,
    /// From `minutes` before the session started.
    Custom { minutes: i64 },
}

/// A time range pinned to a concrete start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub retention: RetentionPolicy,
    /// Set when the range only makes sense reading the file from the top.
    pub force_start: Option<StartMode>,
}

impl TimeRange {
    /// Builds a range from a preset name, using `minutes` where one is needed.
    pub fn from_preset(name: &str, minutes: i64) -> Result<Self, RangeError> {
        let range = match name {
            "trailing" => Self::Trailing { minutes },
            "last-1-hour" | "1h" => Self::LastHour,
            "today" => Self::Today,
            "this-week" => Self::ThisWeek,
            "all-time" | "alltime" => Self::AllTime,
            "custom" => Self::Custom { minutes },
            _ => return Err(RangeError::UnknownPreset(name.to_string())),
        };
        range.validate()
    }

    fn validate(self) -> Result<Self, RangeError> {
        match self {
            Self::Trailing { minutes } | Self::Custom { minutes }
                if minutes < 1 || Duration::try_minutes(minutes).is_none() =>
            {
                Err(RangeError::InvalidMinutes(minutes))
            }
            _ => Ok(self),
        }
    }

    /// Pins the range against the local wall-clock time `now`.
    #[must_use]
    pub fn resolve(self, now: NaiveDateTime) -> ResolvedRange {
        let fixed = |start| ResolvedRange {
            retention: RetentionPolicy::FixedStart(start),
            force_start: None,
        };

        match self {
            Self::Trailing { minutes } => ResolvedRange {
                retention: RetentionPolicy::trailing_minutes(minutes),
                force_start: None,
            },
            Self::LastHour => fixed(now - Duration::hours(1)),
            Self::Today => fixed(now.date().and_time(NaiveTime::MIN)),
            Self::ThisWeek => {
                let days_since_monday = now.weekday().num_days_from_monday();
                let monday = now.date() - Duration::days(i64::from(days_since_monday));
                fixed(monday.and_time(NaiveTime::MIN))
            }
            Self::AllTime => ResolvedRange {
                retention: RetentionPolicy::Unbounded,
                force_start: Some(StartMode::Beginning),
            },
            // A start before the earliest representable time means no start.
            Self::Custom { minutes } => Duration::try_minutes(minutes)
                .and_then(|length| now.checked_sub_signed(length))
                .map_or(
                    ResolvedRange {
                        retention: RetentionPolicy::Unbounded,
                        force_start: None,
                    },
                    fixed,
                ),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trailing { minutes } => write!(f, "trailing {minutes}m"),
            Self::LastHour => f.write_str("last-1-hour"),
            Self::Today => f.write_str("today"),
            Self::ThisWeek => f.write_str("this-week"),
            Self::AllTime => f.write_str("all-time"),
            Self::Custom { minutes } => write!(f, "custom {minutes}m"),
        }
    }
}

impl FromStr for TimeRange {
    type Err = RangeError;

    /// Parses a preset name; ranges that need a length default to an hour.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_preset(s, 60)
    }
}
