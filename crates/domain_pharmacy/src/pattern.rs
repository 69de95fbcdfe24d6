//! Schedule patterns
//!
//! The persisted, structured representation of a parsed prescription's
//! dosing timing. Each shape is a distinct variant so administration
//! generation can pattern-match exhaustively instead of probing optional
//! fields.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::frequency::FrequencyCode;

/// A prescription's dosing timing, as stored on the prescription for MAR use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchedulePattern {
    /// Evenly spaced doses derived from a frequency code
    Standard {
        frequency_code: FrequencyCode,
        times_per_day: u32,
    },
    /// Named morning/noon/evening doses
    SplitDose {
        morning: Decimal,
        noon: Decimal,
        evening: Decimal,
        daily_total: Decimal,
    },
    /// Explicit hour offsets from the first dose
    CustomInterval {
        intervals_hours: Vec<u32>,
        dose_per_interval: Decimal,
        total_doses: u32,
    },
    /// One dose per day, stepping down through the sequence
    Taper {
        doses: Vec<Decimal>,
        duration_days: u32,
    },
    /// Single immediate dose
    Stat,
    /// As needed; no materialized schedule
    Prn {
        max_daily: Option<u32>,
        duration_days: Option<u32>,
    },
}

impl SchedulePattern {
    /// Total number of scheduled doses, where the shape defines one
    ///
    /// Standard patterns need a duration to answer this, and PRN has no
    /// schedule at all, so both return None.
    pub fn total_doses(&self) -> Option<u32> {
        match self {
            SchedulePattern::CustomInterval { total_doses, .. } => Some(*total_doses),
            SchedulePattern::Taper { doses, .. } => Some(doses.len() as u32),
            SchedulePattern::Stat => Some(1),
            _ => None,
        }
    }
}
