//! Coverage calculation results
//!
//! A [`CoverageResult`] is a computed value object, produced fresh on every
//! calculation and never persisted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Money, RuleId};

use crate::rule::CoverageType;

/// Which kind of rule drove a coverage calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// No applicable rule; patient pays everything
    None,
    /// Category-wide rule (explicit or synthesized from a plan default)
    General,
    /// Item-specific rule
    Specific,
    /// Flexible-copay rule for an unmapped item
    FlexibleCopay,
}

/// The insurer/patient split for one billable line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    /// Whether the insurer covers any part of this item
    pub is_covered: bool,
    /// Which kind of rule applied
    pub rule_type: RuleType,
    /// The applied rule, when it exists in the rule store (virtual
    /// plan-default rules report None)
    pub rule_id: Option<RuleId>,
    /// Coverage mode of the applied rule
    pub coverage_type: Option<CoverageType>,
    /// Insurer share in percentage points
    pub coverage_percentage: Decimal,
    /// Resolved per-unit price the split was computed from
    pub insurance_tariff: Money,
    /// Resolved unit price times quantity
    pub subtotal: Money,
    /// Amount billed to the insurer
    pub insurance_pays: Money,
    /// Amount billed to the patient
    pub patient_pays: Money,
    /// Whether dispensing requires prior insurer approval
    pub requires_preauthorization: bool,
    /// Whether a per-visit limit was exceeded
    pub exceeded_limit: bool,
    /// Human-readable description of the exceeded limit
    pub limit_message: Option<String>,
    /// The item has no negotiated tariff under this plan
    pub is_unmapped: bool,
    /// A flexible copay was applied instead of a tariff-based split
    pub has_flexible_copay: bool,
}

impl CoverageResult {
    /// A zero-coverage result: the patient pays the full subtotal
    pub fn uncovered(unit_price: Money, subtotal: Money) -> Self {
        Self {
            is_covered: false,
            rule_type: RuleType::None,
            rule_id: None,
            coverage_type: None,
            coverage_percentage: Decimal::ZERO,
            insurance_tariff: unit_price,
            subtotal,
            insurance_pays: Money::zero(subtotal.currency()),
            patient_pays: subtotal.round_standard(),
            requires_preauthorization: false,
            exceeded_limit: false,
            limit_message: None,
            is_unmapped: false,
            has_flexible_copay: false,
        }
    }

    /// Returns true when the split covers the whole subtotal
    pub fn splits_exactly(&self) -> bool {
        (self.insurance_pays + self.patient_pays) == self.subtotal.round_standard()
    }
}
