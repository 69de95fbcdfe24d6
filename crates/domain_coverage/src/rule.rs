//! Coverage rule types and value objects
//!
//! A coverage rule states how much of an item's cost the insurer covers,
//! optionally scoped to a specific item code. Rules are created and edited
//! by plan administrators and are strictly read-only at resolution time.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{EffectiveWindow, Money, PlanId, RuleId};

/// Billable item categories recognized by coverage rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageCategory {
    Consultation,
    Drug,
    Lab,
    Procedure,
    Ward,
    Nursing,
}

impl CoverageCategory {
    /// All categories, in billing display order
    pub const ALL: [CoverageCategory; 6] = [
        CoverageCategory::Consultation,
        CoverageCategory::Drug,
        CoverageCategory::Lab,
        CoverageCategory::Procedure,
        CoverageCategory::Ward,
        CoverageCategory::Nursing,
    ];

    /// Stable lowercase name, used in cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageCategory::Consultation => "consultation",
            CoverageCategory::Drug => "drug",
            CoverageCategory::Lab => "lab",
            CoverageCategory::Procedure => "procedure",
            CoverageCategory::Ward => "ward",
            CoverageCategory::Nursing => "nursing",
        }
    }
}

impl fmt::Display for CoverageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the covered share of an item's cost is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageType {
    /// Insurer pays the full subtotal
    Full,
    /// Insurer pays `coverage_value` percent of the subtotal
    Percentage,
    /// Insurer pays a fixed amount per visit, capped at the subtotal
    Fixed,
    /// Insurer pays nothing
    Excluded,
}

/// A coverage policy statement belonging to an insurance plan
///
/// `item_code = None` makes this a category-wide (general) rule; a non-null
/// code makes it an item-specific override. At most one rule per
/// (plan, category, item_code) is active within any given time window, and a
/// specific rule always beats a general one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRule {
    /// Unique identifier
    pub id: RuleId,
    /// Owning plan
    pub plan_id: PlanId,
    /// Billable category this rule applies to
    pub category: CoverageCategory,
    /// Item code scope; None means the whole category
    pub item_code: Option<String>,
    /// Whether the item is covered at all
    pub is_covered: bool,
    /// Coverage computation mode
    pub coverage_type: CoverageType,
    /// Meaning depends on `coverage_type`: percentage points for Percentage,
    /// a per-visit monetary amount for Fixed, unused otherwise
    pub coverage_value: Decimal,
    /// Negotiated per-unit price overriding both the tariff table and the
    /// item's standard price
    pub tariff_amount: Option<Money>,
    /// Flat per-unit amount charged to the patient on top of their share
    pub patient_copay_amount: Option<Money>,
    /// Patient share in percentage points; replaces the percentage
    /// complement for Percentage rules rather than stacking
    pub patient_copay_percentage: Option<Decimal>,
    /// Advisory per-visit quantity cap
    pub max_quantity_per_visit: Option<u32>,
    /// Hard per-visit cap on the insurer payment
    pub max_amount_per_visit: Option<Money>,
    /// Whether dispensing requires prior insurer approval
    pub requires_preauthorization: bool,
    /// Marks a flexible-copay rule for an item with no negotiated tariff
    pub is_unmapped: bool,
    /// Effective date window (inclusive bounds, open-ended when absent)
    pub effective: EffectiveWindow,
    /// Soft-delete / suspension flag
    pub is_active: bool,
}

impl CoverageRule {
    /// Creates an active, unbounded rule with the given coverage mode
    pub fn new(
        plan_id: PlanId,
        category: CoverageCategory,
        item_code: Option<&str>,
        coverage_type: CoverageType,
        coverage_value: Decimal,
    ) -> Self {
        Self {
            id: RuleId::new_v7(),
            plan_id,
            category,
            item_code: item_code.map(str::to_owned),
            is_covered: coverage_type != CoverageType::Excluded,
            coverage_type,
            coverage_value,
            tariff_amount: None,
            patient_copay_amount: None,
            patient_copay_percentage: None,
            max_quantity_per_visit: None,
            max_amount_per_visit: None,
            requires_preauthorization: false,
            is_unmapped: false,
            effective: EffectiveWindow::unbounded(),
            is_active: true,
        }
    }

    /// Sets a negotiated per-unit tariff on the rule
    pub fn with_tariff_amount(mut self, amount: Money) -> Self {
        self.tariff_amount = Some(amount);
        self
    }

    /// Sets a flat per-unit patient copay
    pub fn with_copay_amount(mut self, amount: Money) -> Self {
        self.patient_copay_amount = Some(amount);
        self
    }

    /// Sets a patient copay percentage (Percentage rules only)
    pub fn with_copay_percentage(mut self, percentage: Decimal) -> Self {
        self.patient_copay_percentage = Some(percentage);
        self
    }

    /// Sets the advisory per-visit quantity cap
    pub fn with_quantity_limit(mut self, max_quantity: u32) -> Self {
        self.max_quantity_per_visit = Some(max_quantity);
        self
    }

    /// Sets the per-visit insurer payment cap
    pub fn with_amount_limit(mut self, max_amount: Money) -> Self {
        self.max_amount_per_visit = Some(max_amount);
        self
    }

    /// Sets the effective date window
    pub fn with_window(mut self, effective: EffectiveWindow) -> Self {
        self.effective = effective;
        self
    }

    /// Requires preauthorization before the item is dispensed
    pub fn with_preauthorization(mut self) -> Self {
        self.requires_preauthorization = true;
        self
    }

    /// Marks this as a flexible-copay rule for an unmapped item
    pub fn unmapped(mut self) -> Self {
        self.is_unmapped = true;
        self
    }

    /// Deactivates the rule
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Returns true if this rule is usable on the given date
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        self.is_active && self.effective.contains(date)
    }

    /// Returns true if this is an item-specific rule
    pub fn is_specific(&self) -> bool {
        self.item_code.is_some()
    }
}
