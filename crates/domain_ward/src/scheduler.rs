//! Medication administration scheduling
//!
//! Materializes MAR rows from a prescription's schedule pattern, adjusts
//! individual dose times with an audit trail, and bulk-cancels doses when a
//! prescription is discontinued. All wall-clock reasoning happens in the
//! facility's timezone.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::{info, instrument};

use core_kernel::{AdministrationId, AdmissionId, Timezone, UserId};
use domain_pharmacy::SchedulePattern;

use crate::administration::{
    AdministrationStatus, MedicationAdministration, ScheduleAdjustment,
};
use crate::error::WardError;
use crate::prescription::Prescription;
use crate::store::AdministrationStore;

/// Duration assumed when a prescription's duration text cannot be parsed
const DEFAULT_DURATION_DAYS: u32 = 5;

/// First-dose anchor hour: the next 06:00 medication round
const ANCHOR_HOUR: u32 = 6;

/// Ward times for the named split-dose slots
const MORNING: u32 = 6;
const NOON: u32 = 12;
const EVENING: u32 = 18;

/// Schedules, adjusts, and discontinues MAR doses
pub struct MedicationScheduler<S: AdministrationStore> {
    store: Arc<S>,
    timezone: Timezone,
}

impl<S: AdministrationStore> MedicationScheduler<S> {
    /// Creates a scheduler anchored to UTC wall-clock time
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            timezone: Timezone::default(),
        }
    }

    /// Anchors wall-clock times in the facility's timezone
    pub fn with_timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }

    /// The first-dose anchor: the next facility-local 06:00
    ///
    /// Strictly before 06:00 the anchor is today's 06:00; at or after 06:00
    /// it rolls to tomorrow. Exactly 06:00 rolls to tomorrow - the current
    /// round has already started.
    pub fn first_dose_anchor(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local = self.timezone.to_local(now);
        let six = NaiveTime::from_hms_opt(ANCHOR_HOUR, 0, 0).expect("valid anchor time");
        let date = if local.time() < six {
            local.date_naive()
        } else {
            local.date_naive() + Duration::days(1)
        };
        self.timezone.at(date, six)
    }

    /// Materializes MAR rows for a prescription's schedule pattern
    ///
    /// PRN prescriptions get no rows - they are administered on demand.
    /// Returns the ids of the created rows in scheduled order.
    #[instrument(skip(self, prescription), fields(prescription_id = %prescription.id))]
    pub fn generate_schedule_from_pattern(
        &self,
        prescription: &Prescription,
        admission_id: AdmissionId,
        now: DateTime<Utc>,
    ) -> Vec<AdministrationId> {
        let Some(pattern) = &prescription.schedule_pattern else {
            return Vec::new();
        };

        let anchor = self.first_dose_anchor(now);
        let duration_days = prescription
            .duration_days()
            .unwrap_or(DEFAULT_DURATION_DAYS);
        let doses = self.dose_times(pattern, anchor, duration_days, now);

        let mut ids = Vec::with_capacity(doses.len());
        for (scheduled_time, dosage_override) in doses {
            let dosage = dosage_override.or_else(|| prescription.dose_quantity.clone());
            let row = MedicationAdministration::scheduled(
                prescription.id,
                admission_id,
                scheduled_time,
                dosage,
            );
            ids.push(row.id);
            self.store.insert(row);
        }

        info!(count = ids.len(), "materialized administration schedule");
        ids
    }

    /// Replaces a prescription's pattern and regenerates its future doses
    ///
    /// Future scheduled rows are cancelled, the new pattern is persisted and
    /// materialized, and a reconfiguration audit record lands on the first
    /// future row.
    pub fn reconfigure_schedule(
        &self,
        prescription: &mut Prescription,
        new_pattern: SchedulePattern,
        admission_id: AdmissionId,
        reconfigured_by: UserId,
        now: DateTime<Utc>,
    ) -> Vec<AdministrationId> {
        let cancelled = self.store.cancel_scheduled(prescription.id, Some(now));
        info!(cancelled, prescription_id = %prescription.id, "cancelled future doses for reconfiguration");

        prescription.schedule_pattern = Some(new_pattern);
        let ids = self.generate_schedule_from_pattern(prescription, admission_id, now);

        let first_future = self
            .store
            .for_prescription(prescription.id)
            .into_iter()
            .find(|row| {
                row.status == AdministrationStatus::Scheduled && row.scheduled_time > now
            });
        if let Some(row) = first_future {
            let scheduled_time = row.scheduled_time;
            // Audit only; the row itself was not moved
            let _ = self.store.update(row.id, |row| {
                row.adjustments.push(ScheduleAdjustment {
                    id: core_kernel::AdjustmentId::new_v7(),
                    original_time: now,
                    adjusted_time: scheduled_time,
                    adjusted_by: reconfigured_by,
                    reason: Some("Schedule reconfigured with new pattern".to_owned()),
                    adjusted_at: now,
                });
                Ok(())
            });
        }

        ids
    }

    /// Moves one dose's scheduled time, with an audit record
    ///
    /// Rejected when the dose has already been administered; the row is left
    /// unmodified.
    pub fn adjust_schedule_time(
        &self,
        administration_id: AdministrationId,
        new_time: DateTime<Utc>,
        adjusted_by: UserId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), WardError> {
        self.store.update(administration_id, |row| {
            row.adjust(new_time, adjusted_by, reason, now)
        })
    }

    /// Resolves one dose to a nursing outcome (given, held, refused, omitted)
    pub fn record_outcome(
        &self,
        administration_id: AdministrationId,
        outcome: AdministrationStatus,
        dosage_given: Option<String>,
        administered_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), WardError> {
        self.store.update(administration_id, |row| {
            row.record_outcome(outcome, dosage_given, administered_by, now)
        })
    }

    /// Discontinues a prescription and cancels its remaining doses
    ///
    /// Every row still awaiting action becomes cancelled in one sweep;
    /// finalized rows are history and stay untouched. Returns the number of
    /// doses cancelled.
    #[instrument(skip(self, prescription), fields(prescription_id = %prescription.id))]
    pub fn discontinue_prescription(
        &self,
        prescription: &mut Prescription,
        discontinued_by: UserId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<usize, WardError> {
        prescription.discontinue(discontinued_by, reason, now)?;
        let cancelled = self.store.cancel_scheduled(prescription.id, None);
        info!(cancelled, "prescription discontinued");
        Ok(cancelled)
    }

    /// Computes every (time, dosage override) pair a pattern expands to
    fn dose_times(
        &self,
        pattern: &SchedulePattern,
        anchor: DateTime<Utc>,
        duration_days: u32,
        now: DateTime<Utc>,
    ) -> Vec<(DateTime<Utc>, Option<String>)> {
        match pattern {
            SchedulePattern::Standard { times_per_day, .. } => {
                let times_per_day = (*times_per_day).max(1);
                let interval = Duration::hours(i64::from(24 / times_per_day));
                let end = anchor + Duration::days(i64::from(duration_days));
                let mut times = Vec::new();
                let mut current = anchor;
                while current < end {
                    times.push((current, None));
                    current += interval;
                }
                times
            }
            SchedulePattern::SplitDose {
                morning,
                noon,
                evening,
                ..
            } => {
                let start_date = self.timezone.local_date(anchor);
                let slots = [
                    (*morning, MORNING),
                    (*noon, NOON),
                    (*evening, EVENING),
                ];
                let mut times = Vec::new();
                for day in 0..duration_days {
                    let date = start_date + Duration::days(i64::from(day));
                    for (dose, hour) in slots {
                        if dose > rust_decimal::Decimal::ZERO {
                            let time =
                                NaiveTime::from_hms_opt(hour, 0, 0).expect("valid slot time");
                            times.push((self.timezone.at(date, time), Some(dose.to_string())));
                        }
                    }
                }
                times
            }
            SchedulePattern::CustomInterval {
                intervals_hours,
                dose_per_interval,
                ..
            } => intervals_hours
                .iter()
                .map(|offset| {
                    (
                        anchor + Duration::hours(i64::from(*offset)),
                        Some(dose_per_interval.to_string()),
                    )
                })
                .collect(),
            SchedulePattern::Taper { doses, .. } => doses
                .iter()
                .enumerate()
                .map(|(day, dose)| {
                    (
                        anchor + Duration::days(day as i64),
                        Some(dose.to_string()),
                    )
                })
                .collect(),
            SchedulePattern::Stat => vec![(now, None)],
            // PRN doses are charted when requested, never pre-scheduled
            SchedulePattern::Prn { .. } => Vec::new(),
        }
    }
}
