//! Parsed prescription results
//!
//! Immutable value objects produced fresh on every parse call.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::frequency::FrequencyCode;
use crate::pattern::SchedulePattern;

/// The shape of schedule a prescription parsed into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    Standard,
    SplitDose,
    CustomInterval,
    Taper,
    Stat,
    Prn,
}

/// The outcome of parsing one prescription instruction
///
/// Invalid input still carries whatever components were recognized, so the
/// UI can show "dose found, duration missing" rather than discarding the
/// prescriber's partial entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPrescription {
    /// Whether the instruction parsed completely
    pub is_valid: bool,
    /// Dose per administration, possibly with a unit ("2", "5 ml")
    pub dose_quantity: Option<String>,
    /// Human-readable frequency description
    pub frequency: Option<String>,
    /// Canonical frequency code, or a shape marker (SPLIT, CUSTOM, TAPER,
    /// STAT, PRN)
    pub frequency_code: Option<String>,
    /// Canonical duration label
    pub duration: Option<String>,
    /// Duration in days
    pub duration_days: Option<u32>,
    /// Units to dispense, rounded up
    pub quantity_to_dispense: Option<u32>,
    /// Schedule shape
    pub schedule_type: Option<ScheduleType>,
    /// Structured pattern for MAR generation
    pub schedule_pattern: Option<SchedulePattern>,
    /// Canonical display text; reparsing it reproduces this result
    pub display_text: Option<String>,
    /// Per-component parse failures, human-readable
    pub errors: Vec<String>,
}

impl ParsedPrescription {
    /// An invalid result with nothing recognized
    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            dose_quantity: None,
            frequency: None,
            frequency_code: None,
            duration: None,
            duration_days: None,
            quantity_to_dispense: None,
            schedule_type: None,
            schedule_pattern: None,
            display_text: None,
            errors,
        }
    }

    /// A STAT (single immediate dose) result
    pub fn stat(dose_quantity: String, quantity: u32) -> Self {
        Self {
            is_valid: true,
            dose_quantity: Some(dose_quantity.clone()),
            frequency: Some("Immediately (STAT)".to_owned()),
            frequency_code: Some("STAT".to_owned()),
            duration: Some("Single dose".to_owned()),
            duration_days: None,
            quantity_to_dispense: Some(quantity),
            schedule_type: Some(ScheduleType::Stat),
            schedule_pattern: Some(SchedulePattern::Stat),
            display_text: Some(format!("{} STAT", dose_quantity)),
            errors: Vec::new(),
        }
    }

    /// A simple PRN (as needed) result
    pub fn prn(dose_quantity: String, quantity: u32) -> Self {
        Self {
            is_valid: true,
            dose_quantity: Some(dose_quantity.clone()),
            frequency: Some("As needed (PRN)".to_owned()),
            frequency_code: Some("PRN".to_owned()),
            duration: Some("As needed".to_owned()),
            duration_days: None,
            quantity_to_dispense: Some(quantity),
            schedule_type: Some(ScheduleType::Prn),
            schedule_pattern: Some(SchedulePattern::Prn {
                max_daily: None,
                duration_days: None,
            }),
            display_text: Some(format!("{} PRN", dose_quantity)),
            errors: Vec::new(),
        }
    }

    /// Doses per day for standard schedules, derived from the code
    pub fn times_per_day(&self) -> Option<u32> {
        self.frequency_code
            .as_deref()
            .and_then(FrequencyCode::from_token)
            .map(|code| code.times_per_day())
    }

    /// The numeric part of the dose ("5 ml" yields 5)
    pub fn dose_numeric(&self) -> Option<Decimal> {
        let dose = self.dose_quantity.as_deref()?;
        let numeric: String = dose
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        numeric.parse().ok()
    }
}
