//! Negotiated tariffs
//!
//! A tariff is a per-plan negotiated unit price for a billable item,
//! distinct from the item's standard cash price. At most one tariff is
//! effective for a (plan, item type, item code) key at any instant.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{EffectiveWindow, Money, PlanId, TariffId};

use crate::rule::CoverageCategory;

/// A negotiated price for a billable item under a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    /// Unique identifier
    pub id: TariffId,
    /// Owning plan
    pub plan_id: PlanId,
    /// Item category this tariff prices
    pub item_type: CoverageCategory,
    /// Item code this tariff prices
    pub item_code: String,
    /// The facility's standard cash price at negotiation time
    pub standard_price: Money,
    /// The negotiated insurer price
    pub insurance_tariff: Money,
    /// Effective date window
    pub effective: EffectiveWindow,
}

impl Tariff {
    /// Creates a tariff effective immediately and until further notice
    pub fn new(
        plan_id: PlanId,
        item_type: CoverageCategory,
        item_code: &str,
        standard_price: Money,
        insurance_tariff: Money,
    ) -> Self {
        Self {
            id: TariffId::new_v7(),
            plan_id,
            item_type,
            item_code: item_code.to_owned(),
            standard_price,
            insurance_tariff,
            effective: EffectiveWindow::unbounded(),
        }
    }

    /// Sets the effective date window
    pub fn with_window(mut self, effective: EffectiveWindow) -> Self {
        self.effective = effective;
        self
    }

    /// Returns true if this tariff is effective on the given date
    pub fn effective_on(&self, date: NaiveDate) -> bool {
        self.effective.contains(date)
    }
}
