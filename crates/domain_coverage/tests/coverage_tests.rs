//! Tests for coverage resolution and calculation
//!
//! Exercises the full engine against the in-memory stores, including rule
//! precedence, the tariff override chain, copays, per-visit limits, and
//! cache invalidation behavior.

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{Currency, Money, PlanId};
use domain_coverage::{
    CoverageCategory, CoverageEngine, CoverageError, CoverageRule, CoverageType, InMemoryRuleStore,
    InMemoryTariffStore, InsurancePlan, MokaRuleCache, RuleType, Tariff,
};
use test_utils::fixtures::{MoneyFixtures, TemporalFixtures};

/// Engine wired to fresh in-memory stores sharing one cache
struct Harness {
    rules: Arc<InMemoryRuleStore>,
    tariffs: Arc<InMemoryTariffStore>,
    engine: CoverageEngine,
    plan_id: PlanId,
}

fn harness() -> Harness {
    let cache = Arc::new(MokaRuleCache::default());
    let rules = Arc::new(InMemoryRuleStore::new(cache.clone()));
    let tariffs = Arc::new(InMemoryTariffStore::new());
    let engine = CoverageEngine::new(rules.clone(), tariffs.clone(), cache);
    Harness {
        rules,
        tariffs,
        engine,
        plan_id: PlanId::new(),
    }
}

mod precedence {
    use super::*;

    #[test]
    fn test_specific_rule_beats_general_rule() {
        let h = harness();
        h.rules.insert_rule(CoverageRule::new(
            h.plan_id,
            CoverageCategory::Drug,
            None,
            CoverageType::Percentage,
            dec!(80),
        ));
        let specific = CoverageRule::new(
            h.plan_id,
            CoverageCategory::Drug,
            Some("DRUG001"),
            CoverageType::Percentage,
            dec!(50),
        );
        let specific_id = specific.id;
        h.rules.insert_rule(specific);

        let resolved = h
            .engine
            .resolve_rule(
                h.plan_id,
                CoverageCategory::Drug,
                Some("DRUG001"),
                TemporalFixtures::as_of(),
            )
            .unwrap();

        assert_eq!(resolved.rule.id, specific_id);
    }

    #[test]
    fn test_deleting_specific_rule_falls_back_to_general_without_stale_cache() {
        let h = harness();
        let general = CoverageRule::new(
            h.plan_id,
            CoverageCategory::Drug,
            None,
            CoverageType::Percentage,
            dec!(80),
        );
        let general_id = general.id;
        h.rules.insert_rule(general);
        let specific = CoverageRule::new(
            h.plan_id,
            CoverageCategory::Drug,
            Some("DRUG001"),
            CoverageType::Percentage,
            dec!(50),
        );
        let specific_id = specific.id;
        h.rules.insert_rule(specific);

        // Warm the cache with the specific rule
        let first = h
            .engine
            .resolve_rule(
                h.plan_id,
                CoverageCategory::Drug,
                Some("DRUG001"),
                TemporalFixtures::as_of(),
            )
            .unwrap();
        assert_eq!(first.rule.id, specific_id);

        h.rules.delete_rule(specific_id);

        let second = h
            .engine
            .resolve_rule(
                h.plan_id,
                CoverageCategory::Drug,
                Some("DRUG001"),
                TemporalFixtures::as_of(),
            )
            .unwrap();
        assert_eq!(second.rule.id, general_id);
    }

    #[test]
    fn test_updating_rule_is_visible_to_next_calculation() {
        let h = harness();
        let mut rule = CoverageRule::new(
            h.plan_id,
            CoverageCategory::Lab,
            None,
            CoverageType::Percentage,
            dec!(50),
        );
        h.rules.insert_rule(rule.clone());

        let before = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Lab,
                "FBC",
                MoneyFixtures::ghs(dec!(100.00)),
                1,
                TemporalFixtures::as_of(),
            )
            .unwrap();
        assert_eq!(before.insurance_pays.amount(), dec!(50.00));

        rule.coverage_value = dec!(90);
        h.rules.update_rule(rule);

        let after = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Lab,
                "FBC",
                MoneyFixtures::ghs(dec!(100.00)),
                1,
                TemporalFixtures::as_of(),
            )
            .unwrap();
        assert_eq!(after.insurance_pays.amount(), dec!(90.00));
    }

    #[test]
    fn test_store_lookup_respects_effective_windows() {
        use domain_coverage::RuleStore;

        let h = harness();
        h.rules.insert_rule(
            CoverageRule::new(
                h.plan_id,
                CoverageCategory::Drug,
                Some("DRUG001"),
                CoverageType::Full,
                dec!(0),
            )
            .with_window(TemporalFixtures::window_2025()),
        );

        let found = h.rules.find_specific_rule(
            h.plan_id,
            CoverageCategory::Drug,
            "DRUG001",
            TemporalFixtures::as_of(),
        );
        assert!(found.is_some());

        let outside = h.rules.find_specific_rule(
            h.plan_id,
            CoverageCategory::Drug,
            "DRUG001",
            chrono::NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        );
        assert!(outside.is_none());

        let general = h
            .rules
            .find_general_rule(h.plan_id, CoverageCategory::Drug, TemporalFixtures::as_of());
        assert!(general.is_none());
    }

    #[test]
    fn test_future_dated_rule_resolves_to_none() {
        let h = harness();
        h.rules.insert_rule(
            CoverageRule::new(
                h.plan_id,
                CoverageCategory::Drug,
                None,
                CoverageType::Full,
                dec!(0),
            )
            .with_window(TemporalFixtures::window_future()),
        );

        let resolved = h.engine.resolve_rule(
            h.plan_id,
            CoverageCategory::Drug,
            None,
            TemporalFixtures::as_of(),
        );
        assert!(resolved.is_none());
    }

    #[test]
    fn test_plan_category_default_backs_missing_general_rule() {
        let h = harness();
        let plan = InsurancePlan::new("Staff Scheme")
            .with_category_default(CoverageCategory::Drug, dec!(70));
        let plan = InsurancePlan { id: h.plan_id, ..plan };
        h.rules.upsert_plan(plan);

        let result = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Drug,
                "AMOX250",
                MoneyFixtures::ghs(dec!(10.00)),
                2,
                TemporalFixtures::as_of(),
            )
            .unwrap();

        assert!(result.is_covered);
        assert_eq!(result.rule_type, RuleType::General);
        assert_eq!(result.rule_id, None);
        assert_eq!(result.insurance_pays.amount(), dec!(14.00));
        assert_eq!(result.patient_pays.amount(), dec!(6.00));
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_no_rule_means_patient_pays_everything() {
        let h = harness();

        let result = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Procedure,
                "PROC009",
                MoneyFixtures::ghs(dec!(150.00)),
                2,
                TemporalFixtures::as_of(),
            )
            .unwrap();

        assert!(!result.is_covered);
        assert_eq!(result.rule_type, RuleType::None);
        assert!(result.insurance_pays.is_zero());
        assert_eq!(result.patient_pays.amount(), dec!(300.00));
    }

    #[test]
    fn test_full_coverage_zeroes_patient_share() {
        let h = harness();
        h.rules.insert_rule(CoverageRule::new(
            h.plan_id,
            CoverageCategory::Consultation,
            None,
            CoverageType::Full,
            dec!(0),
        ));

        let result = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Consultation,
                "OPD",
                MoneyFixtures::ghs(dec!(60.00)),
                1,
                TemporalFixtures::as_of(),
            )
            .unwrap();

        assert_eq!(result.coverage_percentage, dec!(100));
        assert_eq!(result.insurance_pays.amount(), dec!(60.00));
        assert!(result.patient_pays.is_zero());
    }

    #[test]
    fn test_excluded_coverage_charges_patient_everything() {
        let h = harness();
        h.rules.insert_rule(CoverageRule::new(
            h.plan_id,
            CoverageCategory::Drug,
            Some("COSM01"),
            CoverageType::Excluded,
            dec!(0),
        ));

        let result = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Drug,
                "COSM01",
                MoneyFixtures::ghs(dec!(25.00)),
                3,
                TemporalFixtures::as_of(),
            )
            .unwrap();

        assert!(!result.is_covered);
        assert!(result.insurance_pays.is_zero());
        assert_eq!(result.patient_pays.amount(), dec!(75.00));
    }

    #[test]
    fn test_fixed_coverage_caps_at_subtotal() {
        let h = harness();
        h.rules.insert_rule(CoverageRule::new(
            h.plan_id,
            CoverageCategory::Lab,
            None,
            CoverageType::Fixed,
            dec!(200),
        ));

        let result = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Lab,
                "MAL",
                MoneyFixtures::ghs(dec!(30.00)),
                1,
                TemporalFixtures::as_of(),
            )
            .unwrap();

        // Fixed amount exceeds the bill; insurer pays only the subtotal
        assert_eq!(result.insurance_pays.amount(), dec!(30.00));
        assert!(result.patient_pays.is_zero());
    }

    #[test]
    fn test_fixed_coverage_below_subtotal_leaves_remainder_to_patient() {
        let h = harness();
        h.rules.insert_rule(CoverageRule::new(
            h.plan_id,
            CoverageCategory::Lab,
            None,
            CoverageType::Fixed,
            dec!(50),
        ));

        let result = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Lab,
                "LFT",
                MoneyFixtures::ghs(dec!(40.00)),
                3,
                TemporalFixtures::as_of(),
            )
            .unwrap();

        assert_eq!(result.insurance_pays.amount(), dec!(50.00));
        assert_eq!(result.patient_pays.amount(), dec!(70.00));
    }

    #[test]
    fn test_copay_percentage_replaces_complement_not_stacks() {
        let h = harness();
        h.rules.insert_rule(
            CoverageRule::new(
                h.plan_id,
                CoverageCategory::Drug,
                None,
                CoverageType::Percentage,
                dec!(80),
            )
            .with_copay_percentage(dec!(10)),
        );

        let result = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Drug,
                "AMOX250",
                MoneyFixtures::ghs(dec!(100.00)),
                1,
                TemporalFixtures::as_of(),
            )
            .unwrap();

        // Copay of 10% overrides the 20% complement: insurer pays 90
        assert_eq!(result.coverage_percentage, dec!(90));
        assert_eq!(result.insurance_pays.amount(), dec!(90.00));
        assert_eq!(result.patient_pays.amount(), dec!(10.00));
    }

    #[test]
    fn test_flat_copay_adds_per_unit_on_percentage_split() {
        let h = harness();
        h.rules.insert_rule(
            CoverageRule::new(
                h.plan_id,
                CoverageCategory::Drug,
                None,
                CoverageType::Percentage,
                dec!(80),
            )
            .with_copay_amount(MoneyFixtures::ghs(dec!(1.50))),
        );

        let result = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Drug,
                "AMOX250",
                MoneyFixtures::ghs(dec!(10.00)),
                4,
                TemporalFixtures::as_of(),
            )
            .unwrap();

        // 80% of 40.00 = 32.00 insurer; patient 8.00 + 4 x 1.50 copay
        assert_eq!(result.insurance_pays.amount(), dec!(32.00));
        assert_eq!(result.patient_pays.amount(), dec!(14.00));
    }

    #[test]
    fn test_negative_unit_price_is_rejected() {
        let h = harness();

        let result = h.engine.calculate_coverage_as_of(
            h.plan_id,
            CoverageCategory::Drug,
            "AMOX250",
            MoneyFixtures::ghs(dec!(-1.00)),
            1,
            TemporalFixtures::as_of(),
        );

        assert!(matches!(result, Err(CoverageError::NegativeUnitPrice(_))));
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let h = harness();

        let result = h.engine.calculate_coverage_as_of(
            h.plan_id,
            CoverageCategory::Drug,
            "AMOX250",
            MoneyFixtures::ghs(dec!(1.00)),
            0,
            TemporalFixtures::as_of(),
        );

        assert!(matches!(result, Err(CoverageError::ZeroQuantity)));
    }
}

mod tariffs {
    use super::*;

    #[test]
    fn test_rule_tariff_with_copay_overrides_standard_price() {
        // Spec scenario: general 80% drug rule plus a specific full-coverage
        // rule carrying its own tariff for DRUG001.
        let h = harness();
        h.rules.insert_rule(CoverageRule::new(
            h.plan_id,
            CoverageCategory::Drug,
            None,
            CoverageType::Percentage,
            dec!(80),
        ));
        h.rules.insert_rule(
            CoverageRule::new(
                h.plan_id,
                CoverageCategory::Drug,
                Some("DRUG001"),
                CoverageType::Full,
                dec!(0),
            )
            .with_tariff_amount(MoneyFixtures::ghs(dec!(10.00)))
            .with_copay_amount(MoneyFixtures::zero()),
        );

        let result = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Drug,
                "DRUG001",
                MoneyFixtures::ghs(dec!(20.00)),
                1,
                TemporalFixtures::as_of(),
            )
            .unwrap();

        assert_eq!(result.rule_type, RuleType::Specific);
        assert_eq!(result.insurance_tariff.amount(), dec!(10.00));
        assert_eq!(result.insurance_pays.amount(), dec!(10.00));
        assert_eq!(result.patient_pays.amount(), dec!(0.00));
    }

    #[test]
    fn test_tariff_table_used_when_rule_has_no_tariff_amount() {
        let h = harness();
        h.rules.insert_rule(CoverageRule::new(
            h.plan_id,
            CoverageCategory::Drug,
            None,
            CoverageType::Percentage,
            dec!(50),
        ));
        h.tariffs.insert(Tariff::new(
            h.plan_id,
            CoverageCategory::Drug,
            "AMOX250",
            MoneyFixtures::ghs(dec!(10.00)),
            MoneyFixtures::ghs(dec!(6.00)),
        ));

        let result = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Drug,
                "AMOX250",
                MoneyFixtures::ghs(dec!(10.00)),
                2,
                TemporalFixtures::as_of(),
            )
            .unwrap();

        // Negotiated 6.00 replaces the 10.00 standard price
        assert_eq!(result.insurance_tariff.amount(), dec!(6.00));
        assert_eq!(result.subtotal.amount(), dec!(12.00));
        assert_eq!(result.insurance_pays.amount(), dec!(6.00));
        assert_eq!(result.patient_pays.amount(), dec!(6.00));
    }

    #[test]
    fn test_standard_price_used_when_no_tariff_anywhere() {
        let h = harness();
        h.rules.insert_rule(CoverageRule::new(
            h.plan_id,
            CoverageCategory::Drug,
            None,
            CoverageType::Percentage,
            dec!(50),
        ));

        let result = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Drug,
                "AMOX250",
                MoneyFixtures::ghs(dec!(10.00)),
                1,
                TemporalFixtures::as_of(),
            )
            .unwrap();

        assert_eq!(result.insurance_tariff.amount(), dec!(10.00));
    }
}

mod limits {
    use super::*;

    #[test]
    fn test_quantity_limit_is_advisory() {
        let h = harness();
        h.rules.insert_rule(
            CoverageRule::new(
                h.plan_id,
                CoverageCategory::Drug,
                None,
                CoverageType::Percentage,
                dec!(100),
            )
            .with_quantity_limit(10),
        );

        let result = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Drug,
                "AMOX250",
                MoneyFixtures::ghs(dec!(2.00)),
                15,
                TemporalFixtures::as_of(),
            )
            .unwrap();

        assert!(result.exceeded_limit);
        assert_eq!(
            result.limit_message.as_deref(),
            Some("Quantity 15 exceeds plan limit of 10 per visit")
        );
        // Coverage still computed on the requested quantity
        assert_eq!(result.insurance_pays.amount(), dec!(30.00));
    }

    #[test]
    fn test_amount_limit_caps_insurer_payment() {
        let h = harness();
        h.rules.insert_rule(
            CoverageRule::new(
                h.plan_id,
                CoverageCategory::Procedure,
                None,
                CoverageType::Full,
                dec!(0),
            )
            .with_amount_limit(MoneyFixtures::ghs(dec!(500.00))),
        );

        let result = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Procedure,
                "SURG01",
                MoneyFixtures::ghs(dec!(800.00)),
                1,
                TemporalFixtures::as_of(),
            )
            .unwrap();

        assert!(result.exceeded_limit);
        assert_eq!(result.insurance_pays.amount(), dec!(500.00));
        assert_eq!(result.patient_pays.amount(), dec!(300.00));
    }

    #[test]
    fn test_amount_limit_not_flagged_when_under() {
        let h = harness();
        h.rules.insert_rule(
            CoverageRule::new(
                h.plan_id,
                CoverageCategory::Procedure,
                None,
                CoverageType::Full,
                dec!(0),
            )
            .with_amount_limit(MoneyFixtures::ghs(dec!(500.00))),
        );

        let result = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Procedure,
                "MINOR01",
                MoneyFixtures::ghs(dec!(200.00)),
                1,
                TemporalFixtures::as_of(),
            )
            .unwrap();

        assert!(!result.exceeded_limit);
        assert!(result.limit_message.is_none());
    }
}

mod flexible_copay {
    use super::*;

    #[test]
    fn test_unmapped_item_with_copay_charges_copay_only() {
        let h = harness();
        h.rules.insert_rule(
            CoverageRule::new(
                h.plan_id,
                CoverageCategory::Drug,
                Some("HERB01"),
                CoverageType::Fixed,
                dec!(0),
            )
            .unmapped()
            .with_copay_amount(MoneyFixtures::ghs(dec!(2.50))),
        );

        let result = h
            .engine
            .calculate_coverage_as_of(
                h.plan_id,
                CoverageCategory::Drug,
                "HERB01",
                MoneyFixtures::ghs(dec!(30.00)),
                4,
                TemporalFixtures::as_of(),
            )
            .unwrap();

        assert!(result.is_covered);
        assert_eq!(result.rule_type, RuleType::FlexibleCopay);
        assert!(result.has_flexible_copay);
        assert!(result.is_unmapped);
        assert!(result.insurance_pays.is_zero());
        assert_eq!(result.patient_pays.amount(), dec!(10.00));
    }
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Percentage coverage with no copay override always splits the
        // subtotal exactly, and the insurer side matches the rounded formula.
        #[test]
        fn percentage_split_is_exact(
            unit in test_utils::generators::positive_money_ghs(),
            quantity in 1u32..50u32,
            pct in test_utils::generators::percentage()
        ) {
            let h = harness();
            h.rules.insert_rule(CoverageRule::new(
                h.plan_id,
                CoverageCategory::Drug,
                None,
                CoverageType::Percentage,
                pct,
            ));

            let result = h
                .engine
                .calculate_coverage_as_of(
                    h.plan_id,
                    CoverageCategory::Drug,
                    "ITEM",
                    unit,
                    quantity,
                    TemporalFixtures::as_of(),
                )
                .unwrap();

            let subtotal = result.subtotal.round_standard();
            prop_assert_eq!(result.insurance_pays + result.patient_pays, subtotal);

            let expected = result
                .subtotal
                .multiply(pct / rust_decimal::Decimal::from(100))
                .round_standard();
            prop_assert_eq!(result.insurance_pays, expected);
        }

        // Rule-level tariff plus flat copay is independent of the standard
        // price: insurer pays T x Q, patient pays C x Q.
        #[test]
        fn rule_tariff_and_copay_ignore_standard_price(
            standard in test_utils::generators::money_ghs(),
            tariff_minor in 1i64..100_000i64,
            copay_minor in 0i64..10_000i64,
            quantity in 1u32..30u32
        ) {
            let tariff = Money::from_minor(tariff_minor, Currency::GHS);
            let copay = Money::from_minor(copay_minor, Currency::GHS);

            let h = harness();
            h.rules.insert_rule(
                CoverageRule::new(
                    h.plan_id,
                    CoverageCategory::Drug,
                    Some("DRUG001"),
                    CoverageType::Full,
                    dec!(0),
                )
                .with_tariff_amount(tariff)
                .with_copay_amount(copay),
            );

            let result = h
                .engine
                .calculate_coverage_as_of(
                    h.plan_id,
                    CoverageCategory::Drug,
                    "DRUG001",
                    standard,
                    quantity,
                    TemporalFixtures::as_of(),
                )
                .unwrap();

            let qty = rust_decimal::Decimal::from(quantity);
            prop_assert_eq!(result.insurance_pays, tariff.multiply(qty).round_standard());
            prop_assert_eq!(result.patient_pays, copay.multiply(qty).round_standard());
        }
    }
}
