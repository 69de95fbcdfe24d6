//! Pre-built test data for kernel value types
//!
//! Fixtures are deterministic wherever determinism matters (dates, amounts)
//! and random only for identifiers, which tests should never compare against
//! literals anyway.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use core_kernel::{
    AdmissionId, Currency, EffectiveWindow, Money, PlanId, PrescriptionId, Timezone, UserId,
};
use rust_decimal::Decimal;

/// Monetary fixtures in the facility's billing currency
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// An amount in Ghana cedis
    pub fn ghs(amount: Decimal) -> Money {
        Money::new(amount, Currency::GHS)
    }

    /// Zero cedis
    pub fn zero() -> Money {
        Money::zero(Currency::GHS)
    }
}

/// Temporal fixtures pinned to a fixed reference day
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// The suite's reference "today"
    pub fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 15).unwrap()
    }

    /// A window covering all of 2025
    pub fn window_2025() -> EffectiveWindow {
        EffectiveWindow::between(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        )
        .unwrap()
    }

    /// A window that only opens next year
    pub fn window_future() -> EffectiveWindow {
        EffectiveWindow::starting(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
    }

    /// The facility timezone used throughout the suite
    pub fn facility_tz() -> Timezone {
        Timezone::new(chrono_tz::Africa::Accra)
    }

    /// A UTC instant on the reference day at the given local wall-clock time
    ///
    /// Accra is UTC+0, so local wall-clock equals UTC here.
    pub fn ward_clock(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(
            &Self::as_of().and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap()),
        )
    }
}

/// Identifier fixtures
pub struct IdFixtures;

impl IdFixtures {
    pub fn plan_id() -> PlanId {
        PlanId::new()
    }

    pub fn prescription_id() -> PrescriptionId {
        PrescriptionId::new()
    }

    pub fn admission_id() -> AdmissionId {
        AdmissionId::new()
    }

    pub fn nurse_id() -> UserId {
        UserId::new()
    }
}
