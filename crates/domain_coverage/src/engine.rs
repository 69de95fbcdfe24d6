//! Coverage resolution engine
//!
//! Resolves the applicable rule for a billable item and computes the
//! insurer/patient split. Rule precedence is an explicit lookup chain rather
//! than dispatch: specific rule, then general rule, then the plan's category
//! default, then no coverage - auditable in one function.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, instrument};

use core_kernel::{Money, PlanId, Rate};

use crate::cache::{cache_keys, CacheEntry, RuleCache};
use crate::error::CoverageError;
use crate::ports::{RuleStore, TariffStore};
use crate::result::{CoverageResult, RuleType};
use crate::rule::{CoverageCategory, CoverageRule, CoverageType};

/// Where a resolved rule came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleSource {
    Specific,
    General,
    PlanDefault,
}

/// A rule together with its provenance
#[derive(Debug, Clone)]
pub struct ResolvedRule {
    pub rule: CoverageRule,
    source: RuleSource,
}

impl ResolvedRule {
    /// The rule type to report on results
    fn rule_type(&self) -> RuleType {
        match self.source {
            RuleSource::Specific => RuleType::Specific,
            RuleSource::General | RuleSource::PlanDefault => RuleType::General,
        }
    }

    /// The rule id to report on results; virtual plan-default rules have none
    fn reportable_id(&self) -> Option<core_kernel::RuleId> {
        match self.source {
            RuleSource::PlanDefault => None,
            _ => Some(self.rule.id),
        }
    }
}

/// The coverage resolution engine
///
/// Read-only over its stores; rule lookups go through the shared cache. The
/// same cache instance must be handed to the rule store so its write-through
/// invalidation reaches the entries populated here.
pub struct CoverageEngine {
    rules: Arc<dyn RuleStore>,
    tariffs: Arc<dyn TariffStore>,
    cache: Arc<dyn RuleCache>,
}

impl CoverageEngine {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        tariffs: Arc<dyn TariffStore>,
        cache: Arc<dyn RuleCache>,
    ) -> Self {
        Self {
            rules,
            tariffs,
            cache,
        }
    }

    /// Resolves the applicable coverage rule for an item
    ///
    /// Lookup order: item-specific rule, then category-wide rule, then a
    /// virtual rule synthesized from the plan's category default. Only rules
    /// whose effective window contains `as_of` qualify; a future-dated rule
    /// with no other applicable rule resolves to none, not an error.
    #[instrument(skip(self), fields(plan_id = %plan_id, category = %category))]
    pub fn resolve_rule(
        &self,
        plan_id: PlanId,
        category: CoverageCategory,
        item_code: Option<&str>,
        as_of: NaiveDate,
    ) -> Option<ResolvedRule> {
        if let Some(code) = item_code {
            let candidates = self.specific_candidates(plan_id, category, code);
            if let Some(rule) = candidates.iter().find(|r| r.applies_on(as_of)) {
                debug!(rule_id = %rule.id, "resolved specific rule");
                return Some(ResolvedRule {
                    rule: rule.clone(),
                    source: RuleSource::Specific,
                });
            }
        }

        let candidates = self.general_candidates(plan_id, category);
        if let Some(rule) = candidates.iter().find(|r| r.applies_on(as_of)) {
            debug!(rule_id = %rule.id, "resolved general rule");
            return Some(ResolvedRule {
                rule: rule.clone(),
                source: RuleSource::General,
            });
        }

        let plan = self.cached_plan(plan_id)?;
        let rule = plan.default_rule_for(category)?;
        debug!("resolved plan category default");
        Some(ResolvedRule {
            rule,
            source: RuleSource::PlanDefault,
        })
    }

    /// Calculates the insurer/patient split for a line item as of today
    pub fn calculate_coverage(
        &self,
        plan_id: PlanId,
        category: CoverageCategory,
        item_code: &str,
        unit_price: Money,
        quantity: u32,
    ) -> Result<CoverageResult, CoverageError> {
        self.calculate_coverage_as_of(
            plan_id,
            category,
            item_code,
            unit_price,
            quantity,
            Utc::now().date_naive(),
        )
    }

    /// Calculates the insurer/patient split for a line item
    ///
    /// The resolved unit price follows a three-level precedence: the rule's
    /// own `tariff_amount`, then the tariff table, then the standard price
    /// passed in. Quantity limits are advisory; amount limits cap the insurer
    /// payment and shift the remainder to the patient. All monetary outputs
    /// are rounded to 2 decimal places with standard rounding.
    #[instrument(skip(self, unit_price), fields(plan_id = %plan_id, category = %category, item_code))]
    pub fn calculate_coverage_as_of(
        &self,
        plan_id: PlanId,
        category: CoverageCategory,
        item_code: &str,
        unit_price: Money,
        quantity: u32,
        as_of: NaiveDate,
    ) -> Result<CoverageResult, CoverageError> {
        if unit_price.is_negative() {
            return Err(CoverageError::NegativeUnitPrice(unit_price.to_string()));
        }
        if quantity == 0 {
            return Err(CoverageError::ZeroQuantity);
        }
        let qty = Decimal::from(quantity);

        // Flexible-copay rules for unmapped items short-circuit the tariff
        // chain entirely: the insurer settles directly with the payer and the
        // patient owes only the configured copay.
        if let Some(rule) = self.find_flexible_copay_rule(plan_id, category, item_code, as_of) {
            if let Some(copay) = rule.patient_copay_amount {
                return Ok(self.flexible_copay_result(&rule, unit_price, copay, qty));
            }
        }

        let resolved = self.resolve_rule(plan_id, category, Some(item_code), as_of);

        let effective_unit = match resolved.as_ref().and_then(|r| r.rule.tariff_amount) {
            Some(rule_tariff) => rule_tariff,
            None => self
                .tariffs
                .find_effective_tariff(plan_id, category, item_code, as_of)
                .map(|t| t.insurance_tariff)
                .unwrap_or(unit_price),
        };
        let subtotal = effective_unit.multiply(qty);

        let resolved = match resolved {
            Some(r) if r.rule.is_covered => r,
            _ => return Ok(CoverageResult::uncovered(effective_unit, subtotal)),
        };
        let rule = &resolved.rule;

        let mut exceeded_limit = false;
        let mut limit_message = None;
        if let Some(max_quantity) = rule.max_quantity_per_visit {
            if quantity > max_quantity {
                exceeded_limit = true;
                limit_message = Some(format!(
                    "Quantity {} exceeds plan limit of {} per visit",
                    quantity, max_quantity
                ));
            }
        }

        let currency = subtotal.currency();
        let (insurance_raw, coverage_percentage) = match rule.coverage_type {
            CoverageType::Full => (subtotal, dec!(100)),
            CoverageType::Percentage => {
                // A copay percentage replaces the complement of the coverage
                // value; the two never stack.
                let pct = rule
                    .patient_copay_percentage
                    .map(|copay| dec!(100) - copay)
                    .unwrap_or(rule.coverage_value);
                (Rate::from_percentage(pct).apply(&subtotal), pct)
            }
            CoverageType::Fixed => {
                let fixed = Money::new(rule.coverage_value, currency);
                let insurer = fixed.checked_min(&subtotal)?;
                let pct = if subtotal.is_zero() {
                    Decimal::ZERO
                } else {
                    insurer.amount() / subtotal.amount() * dec!(100)
                };
                (insurer, pct)
            }
            CoverageType::Excluded => (Money::zero(currency), Decimal::ZERO),
        };

        // Round the insurer side first; the patient share absorbs the
        // rounding remainder so the split always sums to the subtotal.
        let mut insurance_pays = insurance_raw.round_standard();
        let patient_share = subtotal.round_standard().checked_sub(&insurance_pays)?;

        // Flat copay is a post-hoc patient-side add-on; excluded items carry
        // none since the patient already bears the full subtotal.
        let mut patient_pays = patient_share;
        if rule.coverage_type != CoverageType::Excluded {
            if let Some(copay) = rule.patient_copay_amount {
                patient_pays = patient_pays.checked_add(&copay.multiply(qty))?;
            }
        }

        if let Some(max_amount) = rule.max_amount_per_visit {
            if insurance_pays.checked_sub(&max_amount)?.is_positive() {
                exceeded_limit = true;
                limit_message = Some(format!(
                    "Insurance coverage amount exceeds plan limit of {} per visit",
                    max_amount.amount()
                ));
                insurance_pays = max_amount;
                patient_pays = subtotal.round_standard().checked_sub(&insurance_pays)?;
            }
        }

        Ok(CoverageResult {
            is_covered: true,
            rule_type: resolved.rule_type(),
            rule_id: resolved.reportable_id(),
            coverage_type: Some(rule.coverage_type),
            coverage_percentage: coverage_percentage.round_dp(2),
            insurance_tariff: effective_unit,
            subtotal,
            insurance_pays,
            patient_pays: patient_pays.round_standard(),
            requires_preauthorization: rule.requires_preauthorization,
            exceeded_limit,
            limit_message,
            is_unmapped: false,
            has_flexible_copay: false,
        })
    }

    /// Clears the cached lookups for a rule scope
    pub fn clear_rule_cache(
        &self,
        plan_id: PlanId,
        category: CoverageCategory,
        item_code: Option<&str>,
    ) {
        if let Some(code) = item_code {
            self.cache
                .invalidate(&cache_keys::specific_rule(plan_id, category, code));
            self.cache
                .invalidate(&cache_keys::flexible_copay(plan_id, category, code));
        }
        self.cache
            .invalidate(&cache_keys::general_rule(plan_id, category));
    }

    /// Clears every cached lookup for a plan
    pub fn clear_plan_cache(&self, plan_id: PlanId) {
        for category in CoverageCategory::ALL {
            self.cache
                .invalidate(&cache_keys::general_rule(plan_id, category));
        }
        self.cache.invalidate(&cache_keys::plan_defaults(plan_id));
    }

    fn flexible_copay_result(
        &self,
        rule: &CoverageRule,
        unit_price: Money,
        copay: Money,
        qty: Decimal,
    ) -> CoverageResult {
        let subtotal = unit_price.multiply(qty);
        CoverageResult {
            is_covered: true,
            rule_type: RuleType::FlexibleCopay,
            rule_id: Some(rule.id),
            coverage_type: None,
            coverage_percentage: Decimal::ZERO,
            insurance_tariff: unit_price,
            subtotal,
            insurance_pays: Money::zero(subtotal.currency()),
            patient_pays: copay.multiply(qty).round_standard(),
            requires_preauthorization: rule.requires_preauthorization,
            exceeded_limit: false,
            limit_message: None,
            is_unmapped: true,
            has_flexible_copay: true,
        }
    }

    fn find_flexible_copay_rule(
        &self,
        plan_id: PlanId,
        category: CoverageCategory,
        item_code: &str,
        as_of: NaiveDate,
    ) -> Option<CoverageRule> {
        let key = cache_keys::flexible_copay(plan_id, category, item_code);
        let candidates = match self.cache.get(&key) {
            Some(CacheEntry::Rules(rules)) => rules,
            _ => {
                let rules = Arc::new(
                    self.rules
                        .flexible_copay_candidates(plan_id, category, item_code),
                );
                self.cache.put(&key, CacheEntry::Rules(rules.clone()));
                rules
            }
        };
        candidates.iter().find(|r| r.applies_on(as_of)).cloned()
    }

    fn specific_candidates(
        &self,
        plan_id: PlanId,
        category: CoverageCategory,
        item_code: &str,
    ) -> Arc<Vec<CoverageRule>> {
        let key = cache_keys::specific_rule(plan_id, category, item_code);
        match self.cache.get(&key) {
            Some(CacheEntry::Rules(rules)) => rules,
            _ => {
                let rules = Arc::new(
                    self.rules
                        .specific_rule_candidates(plan_id, category, item_code),
                );
                self.cache.put(&key, CacheEntry::Rules(rules.clone()));
                rules
            }
        }
    }

    fn general_candidates(
        &self,
        plan_id: PlanId,
        category: CoverageCategory,
    ) -> Arc<Vec<CoverageRule>> {
        let key = cache_keys::general_rule(plan_id, category);
        match self.cache.get(&key) {
            Some(CacheEntry::Rules(rules)) => rules,
            _ => {
                let rules = Arc::new(self.rules.general_rule_candidates(plan_id, category));
                self.cache.put(&key, CacheEntry::Rules(rules.clone()));
                rules
            }
        }
    }

    fn cached_plan(&self, plan_id: PlanId) -> Option<crate::plan::InsurancePlan> {
        let key = cache_keys::plan_defaults(plan_id);
        let cached = match self.cache.get(&key) {
            Some(CacheEntry::Plan(plan)) => plan,
            _ => {
                let plan = Arc::new(self.rules.find_plan(plan_id));
                self.cache.put(&key, CacheEntry::Plan(plan.clone()));
                plan
            }
        };
        (*cached).clone()
    }
}
