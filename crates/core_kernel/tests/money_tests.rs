//! Unit tests for the Money module
//!
//! Tests cover money creation, arithmetic operations, rounding,
//! currency handling, and edge cases.

use core_kernel::{Currency, Money, MoneyError, Rate};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_creates_money_with_correct_amount() {
        let m = Money::new(dec!(100.50), Currency::GHS);
        assert_eq!(m.amount(), dec!(100.50));
        assert_eq!(m.currency(), Currency::GHS);
    }

    #[test]
    fn test_new_rounds_to_four_decimal_places() {
        let m = Money::new(dec!(100.123456789), Currency::GHS);
        assert_eq!(m.amount(), dec!(100.1235));
    }

    #[test]
    fn test_from_minor_converts_pesewas_correctly() {
        let m = Money::from_minor(10050, Currency::GHS);
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_zero_creates_zero_amount() {
        let m = Money::zero(Currency::NGN);
        assert!(m.is_zero());
        assert_eq!(m.currency(), Currency::NGN);
    }

    #[test]
    fn test_negative_amount_creation() {
        let m = Money::new(dec!(-100.00), Currency::GHS);
        assert!(m.is_negative());
        assert_eq!(m.amount(), dec!(-100.00));
    }
}

mod predicates {
    use super::*;

    #[test]
    fn test_is_zero_true_for_zero_amount() {
        assert!(Money::zero(Currency::GHS).is_zero());
    }

    #[test]
    fn test_is_positive_false_for_zero() {
        assert!(!Money::zero(Currency::GHS).is_positive());
    }

    #[test]
    fn test_is_positive_true_for_positive_amount() {
        assert!(Money::new(dec!(0.01), Currency::GHS).is_positive());
    }

    #[test]
    fn test_is_negative_false_for_zero() {
        assert!(!Money::zero(Currency::GHS).is_negative());
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_addition_same_currency() {
        let a = Money::new(dec!(75.25), Currency::GHS);
        let b = Money::new(dec!(24.75), Currency::GHS);
        assert_eq!((a + b).amount(), dec!(100.00));
    }

    #[test]
    fn test_subtraction_can_go_negative() {
        let a = Money::new(dec!(10.00), Currency::GHS);
        let b = Money::new(dec!(25.00), Currency::GHS);
        assert_eq!((a - b).amount(), dec!(-15.00));
    }

    #[test]
    fn test_checked_add_rejects_currency_mismatch() {
        let ghs = Money::new(dec!(10.00), Currency::GHS);
        let kes = Money::new(dec!(10.00), Currency::KES);
        assert!(matches!(
            ghs.checked_add(&kes),
            Err(MoneyError::CurrencyMismatch(_, _))
        ));
    }

    #[test]
    fn test_multiply_by_quantity() {
        let unit = Money::new(dec!(12.35), Currency::GHS);
        assert_eq!(unit.multiply(dec!(3)).amount(), dec!(37.05));
    }

    #[test]
    fn test_checked_min_picks_smaller() {
        let limit = Money::new(dec!(200.00), Currency::GHS);
        let computed = Money::new(dec!(350.00), Currency::GHS);
        assert_eq!(computed.checked_min(&limit).unwrap(), limit);
    }

    #[test]
    fn test_checked_min_rejects_currency_mismatch() {
        let a = Money::new(dec!(1.00), Currency::GHS);
        let b = Money::new(dec!(1.00), Currency::EUR);
        assert!(a.checked_min(&b).is_err());
    }
}

mod rounding {
    use super::*;

    #[test]
    fn test_round_standard_half_up() {
        let m = Money::new(dec!(33.335), Currency::GHS);
        assert_eq!(m.round_standard().amount(), dec!(33.34));
    }

    #[test]
    fn test_round_standard_half_down_stays() {
        let m = Money::new(dec!(33.334), Currency::GHS);
        assert_eq!(m.round_standard().amount(), dec!(33.33));
    }

    #[test]
    fn test_round_standard_negative_midpoint_away_from_zero() {
        let m = Money::new(dec!(-0.125), Currency::GHS);
        assert_eq!(m.round_standard().amount(), dec!(-0.13));
    }
}

mod rates {
    use super::*;

    #[test]
    fn test_rate_from_percentage() {
        let rate = Rate::from_percentage(dec!(80));
        assert_eq!(rate.as_decimal(), dec!(0.8));
        assert_eq!(rate.as_percentage(), dec!(80));
    }

    #[test]
    fn test_rate_apply_splits_amount() {
        let subtotal = Money::new(dec!(250.00), Currency::GHS);
        let insurer = Rate::from_percentage(dec!(80)).apply(&subtotal);

        assert_eq!(insurer.amount(), dec!(200.00));
        assert_eq!((subtotal - insurer).amount(), dec!(50.00));
    }

    #[test]
    fn test_zero_rate_pays_nothing() {
        let subtotal = Money::new(dec!(99.99), Currency::GHS);
        assert!(Rate::from_percentage(dec!(0)).apply(&subtotal).is_zero());
    }
}

mod serialization {
    use super::*;

    #[test]
    fn test_money_round_trips_through_json() {
        let m = Money::new(dec!(123.45), Currency::GHS);
        let json = serde_json::to_string(&m).unwrap();
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }

    #[test]
    fn test_currency_serializes_uppercase() {
        let json = serde_json::to_string(&Currency::GHS).unwrap();
        assert_eq!(json, "\"GHS\"");
    }
}
