//! Property-based test data generators
//!
//! Strategies shared across the domain crates' proptest suites.

use core_kernel::{Currency, Money};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// A non-negative GHS amount up to ~10 million cedis, in whole pesewas
pub fn money_ghs() -> impl Strategy<Value = Money> {
    (0i64..1_000_000_000i64).prop_map(|minor| Money::from_minor(minor, Currency::GHS))
}

/// A strictly positive GHS amount
pub fn positive_money_ghs() -> impl Strategy<Value = Money> {
    (1i64..1_000_000_000i64).prop_map(|minor| Money::from_minor(minor, Currency::GHS))
}

/// A whole-number coverage percentage in [0, 100]
pub fn percentage() -> impl Strategy<Value = Decimal> {
    (0u32..=100u32).prop_map(Decimal::from)
}

/// A duration in days, as prescriptions are actually written
pub fn day_count() -> impl Strategy<Value = u32> {
    1u32..=365u32
}

/// A duration in weeks
pub fn week_count() -> impl Strategy<Value = u32> {
    1u32..=52u32
}

/// Morning-noon-evening dose triple with at least one non-zero dose
pub fn split_doses() -> impl Strategy<Value = (u32, u32, u32)> {
    (0u32..=4u32, 0u32..=4u32, 0u32..=4u32).prop_filter("daily total must be positive", |(m, n, e)| {
        m + n + e > 0
    })
}

/// A strictly decreasing taper sequence with at least two steps
pub fn taper_doses() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::btree_set(1u32..=30u32, 2..=6)
        .prop_map(|set| set.into_iter().rev().collect())
}
