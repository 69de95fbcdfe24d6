//! Prescriptions as the ward sees them
//!
//! The ward works from the persisted copy of the parsed schedule pattern;
//! the free-text fields are kept for display and for re-deriving the
//! duration at generation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{PrescriptionId, UserId};
use domain_pharmacy::{parse_duration, ParsedPrescription, SchedulePattern};

use crate::error::WardError;

/// A prescription under ward administration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: PrescriptionId,
    pub drug_name: String,
    /// Dose per administration ("2", "5 ml")
    pub dose_quantity: Option<String>,
    /// Frequency as entered or as the parser described it
    pub frequency: Option<String>,
    /// Duration as entered ("5 days", "2 weeks")
    pub duration: Option<String>,
    /// Persisted copy of the parsed schedule pattern, for MAR generation
    pub schedule_pattern: Option<SchedulePattern>,
    pub discontinued_at: Option<DateTime<Utc>>,
    pub discontinued_by: Option<UserId>,
    pub discontinuation_reason: Option<String>,
}

impl Prescription {
    pub fn new(drug_name: &str) -> Self {
        Self {
            id: PrescriptionId::new_v7(),
            drug_name: drug_name.to_owned(),
            dose_quantity: None,
            frequency: None,
            duration: None,
            schedule_pattern: None,
            discontinued_at: None,
            discontinued_by: None,
            discontinuation_reason: None,
        }
    }

    /// Builds a prescription from a valid parse result
    pub fn from_parsed(drug_name: &str, parsed: &ParsedPrescription) -> Self {
        let mut prescription = Self::new(drug_name);
        prescription.dose_quantity = parsed.dose_quantity.clone();
        prescription.frequency = parsed.frequency.clone();
        prescription.duration = parsed.duration.clone();
        prescription.schedule_pattern = parsed.schedule_pattern.clone();
        prescription
    }

    /// Whether a schedule pattern has been configured
    pub fn has_schedule(&self) -> bool {
        self.schedule_pattern.is_some()
    }

    /// Duration in days derived from the free-text duration field
    pub fn duration_days(&self) -> Option<u32> {
        self.duration
            .as_deref()
            .and_then(parse_duration)
            .map(|d| d.days)
    }

    pub fn is_discontinued(&self) -> bool {
        self.discontinued_at.is_some()
    }

    /// Sets discontinuation metadata, once
    pub fn discontinue(
        &mut self,
        by: UserId,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), WardError> {
        if self.is_discontinued() {
            return Err(WardError::AlreadyDiscontinued);
        }
        self.discontinued_at = Some(at);
        self.discontinued_by = Some(by);
        self.discontinuation_reason = reason;
        Ok(())
    }
}
