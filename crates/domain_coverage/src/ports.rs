//! Coverage domain ports
//!
//! The engine reads rules and tariffs through these traits so the backing
//! store (database, in-memory, external API) stays swappable. Candidate
//! lookups return every active rule for a key, newest `effective_from`
//! first; effective-date filtering happens in the engine so cached candidate
//! lists remain valid for any as-of date.

use chrono::NaiveDate;

use core_kernel::PlanId;

use crate::plan::InsurancePlan;
use crate::rule::{CoverageCategory, CoverageRule};
use crate::tariff::Tariff;

/// Read access to coverage rules and plans
pub trait RuleStore: Send + Sync {
    /// Active item-specific candidate rules, newest effective_from first
    fn specific_rule_candidates(
        &self,
        plan_id: PlanId,
        category: CoverageCategory,
        item_code: &str,
    ) -> Vec<CoverageRule>;

    /// Active category-wide candidate rules, newest effective_from first
    fn general_rule_candidates(
        &self,
        plan_id: PlanId,
        category: CoverageCategory,
    ) -> Vec<CoverageRule>;

    /// Active flexible-copay candidate rules for an unmapped item
    fn flexible_copay_candidates(
        &self,
        plan_id: PlanId,
        category: CoverageCategory,
        item_code: &str,
    ) -> Vec<CoverageRule>;

    /// Looks up a plan for category-default fallback
    fn find_plan(&self, plan_id: PlanId) -> Option<InsurancePlan>;

    /// The single active item-specific rule as of a date, or none
    fn find_specific_rule(
        &self,
        plan_id: PlanId,
        category: CoverageCategory,
        item_code: &str,
        as_of: NaiveDate,
    ) -> Option<CoverageRule> {
        self.specific_rule_candidates(plan_id, category, item_code)
            .into_iter()
            .find(|r| r.applies_on(as_of))
    }

    /// The single active category-wide rule as of a date, or none
    fn find_general_rule(
        &self,
        plan_id: PlanId,
        category: CoverageCategory,
        as_of: NaiveDate,
    ) -> Option<CoverageRule> {
        self.general_rule_candidates(plan_id, category)
            .into_iter()
            .find(|r| r.applies_on(as_of))
    }
}

/// Read access to negotiated tariffs
pub trait TariffStore: Send + Sync {
    /// The single tariff effective for the key on the given date, or none
    fn find_effective_tariff(
        &self,
        plan_id: PlanId,
        item_type: CoverageCategory,
        item_code: &str,
        as_of: NaiveDate,
    ) -> Option<Tariff>;
}
