//! Medication administration records
//!
//! One row per scheduled dose. The status state machine is deliberately
//! flat: a dose leaves `Scheduled` exactly once, and every destination is
//! terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{AdjustmentId, AdmissionId, AdministrationId, PrescriptionId, UserId};

use crate::error::WardError;

/// Status of one scheduled dose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdministrationStatus {
    /// Awaiting nursing action
    Scheduled,
    /// Administered to the patient
    Given,
    /// Withheld (patient NPO, clinical contraindication)
    Held,
    /// Refused by the patient
    Refused,
    /// Missed for other reasons
    Omitted,
    /// Cancelled by discontinuation or reconfiguration
    Cancelled,
}

impl AdministrationStatus {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            AdministrationStatus::Scheduled => "scheduled",
            AdministrationStatus::Given => "given",
            AdministrationStatus::Held => "held",
            AdministrationStatus::Refused => "refused",
            AdministrationStatus::Omitted => "omitted",
            AdministrationStatus::Cancelled => "cancelled",
        }
    }

    /// Every state except `Scheduled` is terminal
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AdministrationStatus::Scheduled)
    }

    /// Nursing outcomes a scheduled dose can be resolved to
    pub fn is_nursing_outcome(&self) -> bool {
        matches!(
            self,
            AdministrationStatus::Given
                | AdministrationStatus::Held
                | AdministrationStatus::Refused
                | AdministrationStatus::Omitted
        )
    }
}

impl fmt::Display for AdministrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in a dose's append-only schedule adjustment history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAdjustment {
    pub id: AdjustmentId,
    /// The scheduled time before this adjustment
    pub original_time: DateTime<Utc>,
    /// The scheduled time after this adjustment
    pub adjusted_time: DateTime<Utc>,
    pub adjusted_by: UserId,
    pub reason: Option<String>,
    pub adjusted_at: DateTime<Utc>,
}

/// A single scheduled dose on the MAR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationAdministration {
    pub id: AdministrationId,
    pub prescription_id: PrescriptionId,
    pub admission_id: AdmissionId,
    pub scheduled_time: DateTime<Utc>,
    pub status: AdministrationStatus,
    /// Dose reference at scheduling time, overwritten by the dose actually
    /// given when the nurse records the outcome
    pub dosage_given: Option<String>,
    pub administered_at: Option<DateTime<Utc>>,
    pub administered_by: Option<UserId>,
    pub notes: Option<String>,
    pub is_adjusted: bool,
    /// Append-only audit history of schedule-time changes
    pub adjustments: Vec<ScheduleAdjustment>,
}

impl MedicationAdministration {
    /// Creates a dose awaiting administration
    pub fn scheduled(
        prescription_id: PrescriptionId,
        admission_id: AdmissionId,
        scheduled_time: DateTime<Utc>,
        dosage: Option<String>,
    ) -> Self {
        Self {
            id: AdministrationId::new_v7(),
            prescription_id,
            admission_id,
            scheduled_time,
            status: AdministrationStatus::Scheduled,
            dosage_given: dosage,
            administered_at: None,
            administered_by: None,
            notes: None,
            is_adjusted: false,
            adjustments: Vec::new(),
        }
    }

    /// A dose can be adjusted only while it is still awaiting action
    pub fn can_be_adjusted(&self) -> bool {
        self.status == AdministrationStatus::Scheduled
    }

    /// Moves the scheduled time, appending an audit record
    ///
    /// Fails without touching the row when the dose has left `Scheduled`;
    /// a dose that was already given gets the dedicated message the ward UI
    /// shows verbatim.
    pub fn adjust(
        &mut self,
        new_time: DateTime<Utc>,
        adjusted_by: UserId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), WardError> {
        match self.status {
            AdministrationStatus::Given => return Err(WardError::AlreadyAdministered),
            AdministrationStatus::Scheduled => {}
            other => {
                return Err(WardError::NotAdjustable {
                    status: other.as_str().to_owned(),
                })
            }
        }

        self.adjustments.push(ScheduleAdjustment {
            id: AdjustmentId::new_v7(),
            original_time: self.scheduled_time,
            adjusted_time: new_time,
            adjusted_by,
            reason,
            adjusted_at: now,
        });
        self.scheduled_time = new_time;
        self.is_adjusted = true;
        Ok(())
    }

    /// Raw state-machine transition
    pub fn transition(&mut self, to: AdministrationStatus) -> Result<(), WardError> {
        let allowed = self.status == AdministrationStatus::Scheduled && to.is_terminal();
        if !allowed {
            return Err(WardError::InvalidStatusTransition {
                from: self.status.as_str().to_owned(),
                to: to.as_str().to_owned(),
            });
        }
        self.status = to;
        Ok(())
    }

    /// Resolves a scheduled dose to a nursing outcome, exactly once
    pub fn record_outcome(
        &mut self,
        outcome: AdministrationStatus,
        dosage_given: Option<String>,
        administered_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), WardError> {
        if !outcome.is_nursing_outcome() {
            return Err(WardError::InvalidStatusTransition {
                from: self.status.as_str().to_owned(),
                to: outcome.as_str().to_owned(),
            });
        }
        self.transition(outcome)?;
        if dosage_given.is_some() {
            self.dosage_given = dosage_given;
        }
        self.administered_at = Some(now);
        self.administered_by = Some(administered_by);
        Ok(())
    }

    /// Cancels a still-scheduled dose
    pub fn cancel(&mut self) -> Result<(), WardError> {
        self.transition(AdministrationStatus::Cancelled)
    }
}
