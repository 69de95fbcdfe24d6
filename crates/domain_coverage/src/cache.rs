//! Read-through rule cache
//!
//! Rule lookups are cached per (plan, category[, item code]) key. The cache
//! is strictly a derived projection of the rule store: every rule mutation
//! invalidates the affected keys synchronously, before the write returns, so
//! a resolution call never observes a stale rule after a committed write.
//! On any ambiguity the engine recomputes rather than trusting a hit.

use std::sync::Arc;
use std::time::Duration;

use core_kernel::PlanId;

use crate::plan::InsurancePlan;
use crate::rule::{CoverageCategory, CoverageRule};

/// Cache key construction
///
/// Keys distinguish specific from general sub-keys so invalidation can be
/// scoped to exactly the lookups a rule write affects.
pub mod cache_keys {
    use super::*;

    /// Key for item-specific candidate rules
    pub fn specific_rule(plan_id: PlanId, category: CoverageCategory, item_code: &str) -> String {
        format!("coverage_rule_specific_{}_{}_{}", plan_id, category, item_code)
    }

    /// Key for category-wide candidate rules
    pub fn general_rule(plan_id: PlanId, category: CoverageCategory) -> String {
        format!("coverage_rule_general_{}_{}", plan_id, category)
    }

    /// Key for flexible-copay candidate rules
    pub fn flexible_copay(plan_id: PlanId, category: CoverageCategory, item_code: &str) -> String {
        format!("flexible_copay_rule_{}_{}_{}", plan_id, category, item_code)
    }

    /// Key for a plan's category defaults
    pub fn plan_defaults(plan_id: PlanId) -> String {
        format!("plan_category_defaults_{}", plan_id)
    }
}

/// A cached value
#[derive(Debug, Clone)]
pub enum CacheEntry {
    /// Candidate rule list for a lookup key
    Rules(Arc<Vec<CoverageRule>>),
    /// A plan lookup (None caches the absence of the plan)
    Plan(Arc<Option<InsurancePlan>>),
}

/// Get/put/invalidate access to the rule cache
pub trait RuleCache: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry>;

    fn put(&self, key: &str, entry: CacheEntry);

    fn invalidate(&self, key: &str);
}

/// Default [`RuleCache`] backed by a moka sync cache
///
/// Entries expire after an hour as a safety net; correctness relies on the
/// write-through invalidation performed by the stores, not on the TTL.
pub struct MokaRuleCache {
    inner: moka::sync::Cache<String, CacheEntry>,
}

impl MokaRuleCache {
    const TTL_SECS: u64 = 3600;

    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: moka::sync::Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(Duration::from_secs(Self::TTL_SECS))
                .build(),
        }
    }
}

impl Default for MokaRuleCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl RuleCache for MokaRuleCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, entry: CacheEntry) {
        self.inner.insert(key.to_owned(), entry);
    }

    fn invalidate(&self, key: &str) {
        self.inner.invalidate(key);
    }
}
