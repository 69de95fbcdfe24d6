//! Effective-date windows and facility timezone handling
//!
//! Coverage rules and tariffs are constrained by inclusive calendar-date
//! windows; ward scheduling anchors dose times in the facility's local
//! timezone. Both live here so the domain crates share one set of temporal
//! semantics.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use thiserror::Error;

/// Timezone wrapper for the facility's local time
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Tz::from_str(&s)
            .map(Timezone)
            .map_err(|_| serde::de::Error::custom(format!("Invalid timezone: {}", s)))
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Converts a UTC datetime to the local timezone
    pub fn to_local(&self, utc: DateTime<Utc>) -> DateTime<Tz> {
        utc.with_timezone(&self.0)
    }

    /// Returns the UTC instant for a local wall-clock time on the given date
    ///
    /// Ambiguous local times (DST fold) resolve to the earlier instant; a
    /// local time skipped by a DST jump resolves to the following hour.
    pub fn at(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let local = date.and_time(time);
        match local.and_local_timezone(self.0) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
            LocalResult::None => (local + Duration::hours(1))
                .and_local_timezone(self.0)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&local)),
        }
    }

    /// Returns the local calendar date of a UTC instant
    pub fn local_date(&self, utc: DateTime<Utc>) -> NaiveDate {
        self.to_local(utc).date_naive()
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::UTC)
    }
}

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid window: start {start} must not be after end {end}")]
    InvalidWindow { start: String, end: String },
}

/// An inclusive calendar-date window in which a rule or tariff is effective
///
/// Either bound may be absent: a missing `from` means effective since forever,
/// a missing `to` means effective until further notice. A date is inside the
/// window when `from <= date <= to`, treating absent bounds as unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EffectiveWindow {
    /// First effective date (inclusive), None means unbounded past
    pub from: Option<NaiveDate>,
    /// Last effective date (inclusive), None means unbounded future
    pub to: Option<NaiveDate>,
}

impl EffectiveWindow {
    /// Creates a new window, validating that the bounds are ordered
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, TemporalError> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(TemporalError::InvalidWindow {
                    start: from.to_string(),
                    end: to.to_string(),
                });
            }
        }
        Ok(Self { from, to })
    }

    /// A window with no bounds (always effective)
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// An open-ended window starting on the given date
    pub fn starting(from: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    /// A window bounded on both ends (inclusive)
    pub fn between(from: NaiveDate, to: NaiveDate) -> Result<Self, TemporalError> {
        Self::new(Some(from), Some(to))
    }

    /// Returns true if the given date falls inside the window
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |f| f <= date) && self.to.map_or(true, |t| date <= t)
    }

    /// Returns true if the window has no end date
    pub fn is_open_ended(&self) -> bool {
        self.to.is_none()
    }
}
