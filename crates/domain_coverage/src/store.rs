//! In-memory rule and tariff stores
//!
//! These adapters back the [`RuleStore`]/[`TariffStore`] ports for tests and
//! single-process deployments. Rule mutations invalidate the affected cache
//! keys inside the same critical section as the write, so no lookup can race
//! a write and observe a stale rule.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::NaiveDate;
use tracing::debug;

use core_kernel::{PlanId, RuleId};

use crate::cache::{cache_keys, RuleCache};
use crate::plan::InsurancePlan;
use crate::ports::{RuleStore, TariffStore};
use crate::rule::{CoverageCategory, CoverageRule};
use crate::tariff::Tariff;

/// In-memory [`RuleStore`] with write-through cache invalidation
pub struct InMemoryRuleStore {
    rules: RwLock<Vec<CoverageRule>>,
    plans: RwLock<HashMap<PlanId, InsurancePlan>>,
    cache: Arc<dyn RuleCache>,
}

impl InMemoryRuleStore {
    pub fn new(cache: Arc<dyn RuleCache>) -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
            plans: RwLock::new(HashMap::new()),
            cache,
        }
    }

    /// Creates or replaces a plan
    pub fn upsert_plan(&self, plan: InsurancePlan) {
        let mut plans = self.plans.write().expect("plan store lock poisoned");
        let key = cache_keys::plan_defaults(plan.id);
        plans.insert(plan.id, plan);
        self.cache.invalidate(&key);
    }

    /// Creates a rule, invalidating the lookups it affects
    pub fn insert_rule(&self, rule: CoverageRule) {
        let mut rules = self.rules.write().expect("rule store lock poisoned");
        self.invalidate_for(&rule);
        debug!(rule_id = %rule.id, plan_id = %rule.plan_id, "coverage rule created");
        rules.push(rule);
    }

    /// Replaces a rule by id, invalidating both the old and new lookups
    pub fn update_rule(&self, rule: CoverageRule) {
        let mut rules = self.rules.write().expect("rule store lock poisoned");
        if let Some(existing) = rules.iter_mut().find(|r| r.id == rule.id) {
            self.invalidate_for(existing);
            self.invalidate_for(&rule);
            debug!(rule_id = %rule.id, "coverage rule updated");
            *existing = rule;
        }
    }

    /// Deletes a rule by id, invalidating the lookups it affected
    pub fn delete_rule(&self, rule_id: RuleId) {
        let mut rules = self.rules.write().expect("rule store lock poisoned");
        if let Some(pos) = rules.iter().position(|r| r.id == rule_id) {
            let removed = rules.remove(pos);
            self.invalidate_for(&removed);
            debug!(rule_id = %rule_id, "coverage rule deleted");
        }
    }

    /// Invalidates every cache key a rule participates in
    ///
    /// The general key is always cleared: a scoped rule edit can still change
    /// which candidates a general lookup would return after fallback.
    fn invalidate_for(&self, rule: &CoverageRule) {
        if let Some(code) = &rule.item_code {
            self.cache
                .invalidate(&cache_keys::specific_rule(rule.plan_id, rule.category, code));
            self.cache
                .invalidate(&cache_keys::flexible_copay(rule.plan_id, rule.category, code));
        }
        self.cache
            .invalidate(&cache_keys::general_rule(rule.plan_id, rule.category));
    }

    fn matching(
        &self,
        predicate: impl Fn(&CoverageRule) -> bool,
    ) -> Vec<CoverageRule> {
        let rules = self.rules.read().expect("rule store lock poisoned");
        let mut found: Vec<CoverageRule> = rules
            .iter()
            .filter(|r| r.is_active && predicate(r))
            .cloned()
            .collect();
        // Newest effective_from first; unbounded starts sort last
        found.sort_by(|a, b| b.effective.from.cmp(&a.effective.from));
        found
    }
}

impl RuleStore for InMemoryRuleStore {
    fn specific_rule_candidates(
        &self,
        plan_id: PlanId,
        category: CoverageCategory,
        item_code: &str,
    ) -> Vec<CoverageRule> {
        self.matching(|r| {
            r.plan_id == plan_id
                && r.category == category
                && r.item_code.as_deref() == Some(item_code)
                && !r.is_unmapped
        })
    }

    fn general_rule_candidates(
        &self,
        plan_id: PlanId,
        category: CoverageCategory,
    ) -> Vec<CoverageRule> {
        self.matching(|r| r.plan_id == plan_id && r.category == category && r.item_code.is_none())
    }

    fn flexible_copay_candidates(
        &self,
        plan_id: PlanId,
        category: CoverageCategory,
        item_code: &str,
    ) -> Vec<CoverageRule> {
        self.matching(|r| {
            r.plan_id == plan_id
                && r.category == category
                && r.item_code.as_deref() == Some(item_code)
                && r.is_unmapped
        })
    }

    fn find_plan(&self, plan_id: PlanId) -> Option<InsurancePlan> {
        self.plans
            .read()
            .expect("plan store lock poisoned")
            .get(&plan_id)
            .cloned()
    }
}

/// In-memory [`TariffStore`]
///
/// Tariff lookups are not cached; the table is small and reads are cheap.
pub struct InMemoryTariffStore {
    tariffs: RwLock<Vec<Tariff>>,
}

impl InMemoryTariffStore {
    pub fn new() -> Self {
        Self {
            tariffs: RwLock::new(Vec::new()),
        }
    }

    pub fn insert(&self, tariff: Tariff) {
        self.tariffs
            .write()
            .expect("tariff store lock poisoned")
            .push(tariff);
    }
}

impl Default for InMemoryTariffStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TariffStore for InMemoryTariffStore {
    fn find_effective_tariff(
        &self,
        plan_id: PlanId,
        item_type: CoverageCategory,
        item_code: &str,
        as_of: NaiveDate,
    ) -> Option<Tariff> {
        let tariffs = self.tariffs.read().expect("tariff store lock poisoned");
        let mut effective: Vec<&Tariff> = tariffs
            .iter()
            .filter(|t| {
                t.plan_id == plan_id
                    && t.item_type == item_type
                    && t.item_code == item_code
                    && t.effective_on(as_of)
            })
            .collect();
        effective.sort_by(|a, b| b.effective.from.cmp(&a.effective.from));
        effective.first().map(|t| (*t).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MokaRuleCache;
    use crate::rule::CoverageType;
    use core_kernel::{Currency, Money};
    use rust_decimal_macros::dec;

    fn store() -> InMemoryRuleStore {
        InMemoryRuleStore::new(Arc::new(MokaRuleCache::default()))
    }

    #[test]
    fn test_specific_candidates_exclude_unmapped_rules() {
        let store = store();
        let plan_id = PlanId::new();

        store.insert_rule(CoverageRule::new(
            plan_id,
            CoverageCategory::Drug,
            Some("DRUG001"),
            CoverageType::Percentage,
            dec!(80),
        ));
        store.insert_rule(
            CoverageRule::new(
                plan_id,
                CoverageCategory::Drug,
                Some("DRUG001"),
                CoverageType::Fixed,
                dec!(0),
            )
            .unmapped()
            .with_copay_amount(Money::new(dec!(2.00), Currency::GHS)),
        );

        assert_eq!(
            store
                .specific_rule_candidates(plan_id, CoverageCategory::Drug, "DRUG001")
                .len(),
            1
        );
        assert_eq!(
            store
                .flexible_copay_candidates(plan_id, CoverageCategory::Drug, "DRUG001")
                .len(),
            1
        );
    }

    #[test]
    fn test_inactive_rules_are_not_candidates() {
        let store = store();
        let plan_id = PlanId::new();

        store.insert_rule(
            CoverageRule::new(
                plan_id,
                CoverageCategory::Lab,
                None,
                CoverageType::Full,
                dec!(0),
            )
            .inactive(),
        );

        assert!(store
            .general_rule_candidates(plan_id, CoverageCategory::Lab)
            .is_empty());
    }

    #[test]
    fn test_delete_removes_rule() {
        let store = store();
        let plan_id = PlanId::new();
        let rule = CoverageRule::new(
            plan_id,
            CoverageCategory::Drug,
            None,
            CoverageType::Percentage,
            dec!(50),
        );
        let rule_id = rule.id;
        store.insert_rule(rule);

        store.delete_rule(rule_id);
        assert!(store
            .general_rule_candidates(plan_id, CoverageCategory::Drug)
            .is_empty());
    }

    #[test]
    fn test_latest_effective_tariff_wins() {
        let tariffs = InMemoryTariffStore::new();
        let plan_id = PlanId::new();
        let old = Tariff::new(
            plan_id,
            CoverageCategory::Drug,
            "AMOX250",
            Money::new(dec!(10.00), Currency::GHS),
            Money::new(dec!(6.00), Currency::GHS),
        )
        .with_window(core_kernel::EffectiveWindow::starting(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        ));
        let new = Tariff::new(
            plan_id,
            CoverageCategory::Drug,
            "AMOX250",
            Money::new(dec!(10.00), Currency::GHS),
            Money::new(dec!(7.50), Currency::GHS),
        )
        .with_window(core_kernel::EffectiveWindow::starting(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        ));
        tariffs.insert(old);
        tariffs.insert(new);

        let found = tariffs
            .find_effective_tariff(
                plan_id,
                CoverageCategory::Drug,
                "AMOX250",
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            )
            .unwrap();
        assert_eq!(found.insurance_tariff.amount(), dec!(7.50));
    }
}
