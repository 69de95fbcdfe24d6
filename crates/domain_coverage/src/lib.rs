//! Coverage Resolution Domain
//!
//! This crate determines how the cost of a billable item splits between an
//! insurance plan and the patient. Resolution walks an explicit precedence
//! chain - item-specific rule, then category-wide rule, then the plan's
//! category default - and applies tariff overrides, copays, and per-visit
//! limits to produce a [`CoverageResult`].
//!
//! # Resolution precedence
//!
//! ```text
//! specific rule (plan, category, item code)
//!     -> general rule (plan, category)
//!         -> plan category default (virtual percentage rule)
//!             -> no coverage
//! ```
//!
//! Rule lookups go through a read-through cache whose entries are invalidated
//! synchronously by the stores whenever a rule is created, updated, or
//! deleted, so a resolution call never observes a stale rule after a write.

pub mod cache;
pub mod engine;
pub mod error;
pub mod plan;
pub mod ports;
pub mod result;
pub mod rule;
pub mod store;
pub mod tariff;

pub use cache::{cache_keys, CacheEntry, MokaRuleCache, RuleCache};
pub use engine::CoverageEngine;
pub use error::CoverageError;
pub use plan::InsurancePlan;
pub use ports::{RuleStore, TariffStore};
pub use result::{CoverageResult, RuleType};
pub use rule::{CoverageCategory, CoverageRule, CoverageType};
pub use store::{InMemoryRuleStore, InMemoryTariffStore};
pub use tariff::Tariff;
