//! Vitals observation schedules
//!
//! Ward patients are observed on a fixed interval; the ward dashboard asks
//! whether the next observation is upcoming, due, or overdue. A 15-minute
//! grace window separates "due now" from "overdue".

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AdmissionId, UserId, VitalsScheduleId};

use crate::error::WardError;

/// Narrowest permitted observation interval
pub const MIN_INTERVAL_MINUTES: u32 = 15;

/// Widest permitted observation interval (one day)
pub const MAX_INTERVAL_MINUTES: u32 = 1440;

/// Minutes after the due time during which an observation counts as on time
pub const GRACE_PERIOD_MINUTES: i64 = 15;

/// Where the next observation stands relative to now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueState {
    Upcoming,
    Due,
    Overdue,
}

/// Snapshot answer for the ward dashboard's schedule query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStatus {
    pub state: DueState,
    pub next_due_at: DateTime<Utc>,
    /// Whole minutes until the due time; zero once it has passed
    pub time_until_due_minutes: i64,
    /// Whole minutes past the due time; zero until it has passed
    pub time_overdue_minutes: i64,
}

/// A recurring vitals observation schedule for an admitted patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalsSchedule {
    pub id: VitalsScheduleId,
    pub admission_id: AdmissionId,
    pub interval_minutes: u32,
    /// When vitals were last taken; None until the first recording
    pub last_recorded_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl VitalsSchedule {
    /// Creates a schedule, validating the interval into [15, 1440] minutes
    pub fn new(
        admission_id: AdmissionId,
        interval_minutes: u32,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<Self, WardError> {
        validate_interval(interval_minutes)?;
        Ok(Self {
            id: VitalsScheduleId::new_v7(),
            admission_id,
            interval_minutes,
            last_recorded_at: None,
            is_active: true,
            created_by,
            created_at: now,
        })
    }

    /// Changes the observation interval, re-validating the bounds
    pub fn set_interval(&mut self, interval_minutes: u32) -> Result<(), WardError> {
        validate_interval(interval_minutes)?;
        self.interval_minutes = interval_minutes;
        Ok(())
    }

    /// Records that vitals were taken, starting the next cycle
    pub fn record_taken(&mut self, at: DateTime<Utc>) {
        self.last_recorded_at = Some(at);
    }

    /// Deactivates the schedule (e.g., on discharge)
    pub fn disable(&mut self) {
        self.is_active = false;
    }

    /// When the next observation falls due
    pub fn next_due_at(&self) -> DateTime<Utc> {
        let cycle_start = self.last_recorded_at.unwrap_or(self.created_at);
        cycle_start + Duration::minutes(i64::from(self.interval_minutes))
    }

    /// Answers the ward dashboard's due/overdue query
    pub fn schedule_status(&self, now: DateTime<Utc>) -> ScheduleStatus {
        let next_due_at = self.next_due_at();

        if now < next_due_at {
            return ScheduleStatus {
                state: DueState::Upcoming,
                next_due_at,
                time_until_due_minutes: (next_due_at - now).num_minutes(),
                time_overdue_minutes: 0,
            };
        }

        let overdue_minutes = (now - next_due_at).num_minutes();
        let state = if overdue_minutes <= GRACE_PERIOD_MINUTES {
            DueState::Due
        } else {
            DueState::Overdue
        };

        ScheduleStatus {
            state,
            next_due_at,
            time_until_due_minutes: 0,
            time_overdue_minutes: overdue_minutes,
        }
    }
}

fn validate_interval(interval_minutes: u32) -> Result<(), WardError> {
    if !(MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&interval_minutes) {
        return Err(WardError::InvalidInterval {
            min: MIN_INTERVAL_MINUTES,
            max: MAX_INTERVAL_MINUTES,
            actual: interval_minutes,
        });
    }
    Ok(())
}
