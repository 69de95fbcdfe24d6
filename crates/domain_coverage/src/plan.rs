//! Insurance plans and category defaults
//!
//! A plan may carry default coverage percentages per billable category.
//! When no explicit general rule exists for a category, resolution falls
//! back to a virtual percentage rule synthesized from these defaults.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::PlanId;

use crate::rule::{CoverageCategory, CoverageRule, CoverageType};

/// An insurance product defining coverage rules and tariffs for a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsurancePlan {
    /// Unique identifier
    pub id: PlanId,
    /// Display name
    pub name: String,
    /// Default coverage percentage for consultations
    pub consultation_default: Option<Decimal>,
    /// Default coverage percentage for drugs
    pub drugs_default: Option<Decimal>,
    /// Default coverage percentage for lab tests
    pub labs_default: Option<Decimal>,
    /// Default coverage percentage for procedures
    pub procedures_default: Option<Decimal>,
}

impl InsurancePlan {
    /// Creates a plan with no category defaults
    pub fn new(name: &str) -> Self {
        Self {
            id: PlanId::new_v7(),
            name: name.to_owned(),
            consultation_default: None,
            drugs_default: None,
            labs_default: None,
            procedures_default: None,
        }
    }

    /// Sets a category default percentage
    pub fn with_category_default(mut self, category: CoverageCategory, percentage: Decimal) -> Self {
        match category {
            CoverageCategory::Consultation => self.consultation_default = Some(percentage),
            CoverageCategory::Drug => self.drugs_default = Some(percentage),
            CoverageCategory::Lab => self.labs_default = Some(percentage),
            CoverageCategory::Procedure => self.procedures_default = Some(percentage),
            // Ward and nursing carry no plan-level defaults
            CoverageCategory::Ward | CoverageCategory::Nursing => {}
        }
        self
    }

    /// Returns the default coverage percentage for a category, if configured
    pub fn category_default(&self, category: CoverageCategory) -> Option<Decimal> {
        match category {
            CoverageCategory::Consultation => self.consultation_default,
            CoverageCategory::Drug => self.drugs_default,
            CoverageCategory::Lab => self.labs_default,
            CoverageCategory::Procedure => self.procedures_default,
            CoverageCategory::Ward | CoverageCategory::Nursing => None,
        }
    }

    /// Synthesizes a virtual general percentage rule from the category default
    ///
    /// The returned rule is never persisted; its identifier must not leak
    /// into results.
    pub fn default_rule_for(&self, category: CoverageCategory) -> Option<CoverageRule> {
        let value = self.category_default(category)?;
        let mut rule = CoverageRule::new(self.id, category, None, CoverageType::Percentage, value)
            .with_copay_percentage(dec!(100) - value);
        rule.is_covered = value > dec!(0);
        Some(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rule_synthesized_from_percentage() {
        let plan = InsurancePlan::new("Staff Scheme")
            .with_category_default(CoverageCategory::Drug, dec!(70));

        let rule = plan.default_rule_for(CoverageCategory::Drug).unwrap();
        assert_eq!(rule.coverage_type, CoverageType::Percentage);
        assert_eq!(rule.coverage_value, dec!(70));
        assert_eq!(rule.patient_copay_percentage, Some(dec!(30)));
        assert!(rule.is_covered);
        assert!(!rule.is_specific());
    }

    #[test]
    fn test_zero_default_yields_uncovered_rule() {
        let plan = InsurancePlan::new("Cash Plan")
            .with_category_default(CoverageCategory::Lab, dec!(0));

        let rule = plan.default_rule_for(CoverageCategory::Lab).unwrap();
        assert!(!rule.is_covered);
    }

    #[test]
    fn test_no_default_for_ward_category() {
        let plan = InsurancePlan::new("Standard")
            .with_category_default(CoverageCategory::Ward, dec!(50));

        assert!(plan.default_rule_for(CoverageCategory::Ward).is_none());
    }

    #[test]
    fn test_missing_default_yields_no_rule() {
        let plan = InsurancePlan::new("Standard");
        assert!(plan.default_rule_for(CoverageCategory::Consultation).is_none());
    }
}
