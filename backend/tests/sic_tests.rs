//! Stock-in-count reconciliation tests
//!
//! Tests for physical count usage derivation and the variance arithmetic
//! used by the raw material and product reconciliation reports.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use production_costing_backend::services::sic::computed_usage;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Worked example: open 100, receive 20, waste 5, count 100 => used 15
    #[test]
    fn test_computed_usage_worked_example() {
        let usage = computed_usage(dec("100.0"), dec("20.0"), dec("5.0"), dec("100.0"));
        assert_eq!(usage, dec("15.0"));
    }

    /// Counting everything back with no issues means zero usage
    #[test]
    fn test_computed_usage_zero() {
        let usage = computed_usage(dec("50.0"), Decimal::ZERO, Decimal::ZERO, dec("50.0"));
        assert_eq!(usage, Decimal::ZERO);
    }

    /// Counting more than the books expect yields negative usage,
    /// surfacing the miscount instead of hiding it
    #[test]
    fn test_computed_usage_negative_on_overcount() {
        let usage = computed_usage(dec("50.0"), Decimal::ZERO, Decimal::ZERO, dec("60.0"));
        assert_eq!(usage, dec("-10.0"));
    }

    /// Waste reduces derived usage; it is accounted separately
    #[test]
    fn test_waste_not_counted_as_usage() {
        let with_waste = computed_usage(dec("100.0"), Decimal::ZERO, dec("10.0"), dec("80.0"));
        let without_waste = computed_usage(dec("100.0"), Decimal::ZERO, Decimal::ZERO, dec("80.0"));

        assert_eq!(with_waste, dec("10.0"));
        assert_eq!(without_waste, dec("20.0"));
    }

    /// Raw material variance: expected minus actual, valued at unit cost
    #[test]
    fn test_raw_material_variance_arithmetic() {
        let expected_usage = dec("30.0");
        let actual_usage = dec("34.0");
        let unit_cost = dec("2.5");

        let variance_qty = expected_usage - actual_usage;
        let variance_value = variance_qty * unit_cost;

        assert_eq!(variance_qty, dec("-4.0"));
        assert_eq!(variance_value, dec("-10.0"));
    }

    /// Product variance: revenue expected from counted sales against the
    /// revenue actually recorded at the till
    #[test]
    fn test_product_revenue_variance_arithmetic() {
        let expected_sales_qty = dec("40.0");
        let actual_sales_qty = dec("38.0");
        let avg_price = dec("55.0");

        let expected_revenue = expected_sales_qty * avg_price;
        let actual_revenue = actual_sales_qty * avg_price;
        let variance_revenue = expected_revenue - actual_revenue;

        assert_eq!(expected_revenue, dec("2200.0"));
        assert_eq!(actual_revenue, dec("2090.0"));
        assert_eq!(variance_revenue, dec("110.0"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating non-negative counts
    fn count_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=10000i64).prop_map(|n| Decimal::new(n, 1)) // 0.0 to 1000.0
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Count identity: usage + waste + closing == opening + issues
        #[test]
        fn prop_count_identity(
            opening in count_strategy(),
            issues in count_strategy(),
            waste in count_strategy(),
            closing in count_strategy()
        ) {
            let usage = computed_usage(opening, issues, waste, closing);
            prop_assert_eq!(usage + waste + closing, opening + issues);
        }

        /// Usage grows one-for-one with issued stock
        #[test]
        fn prop_usage_tracks_issues(
            opening in count_strategy(),
            issues in count_strategy(),
            extra in count_strategy(),
            closing in count_strategy()
        ) {
            let base = computed_usage(opening, issues, Decimal::ZERO, closing);
            let more = computed_usage(opening, issues + extra, Decimal::ZERO, closing);
            prop_assert_eq!(more - base, extra);
        }

        /// A perfect count (closing = opening + issues - waste) derives
        /// exactly zero usage
        #[test]
        fn prop_perfect_count_zero_usage(
            opening in count_strategy(),
            issues in count_strategy(),
            waste in count_strategy()
        ) {
            let closing = opening + issues - waste;
            let usage = computed_usage(opening, issues, waste, closing);
            prop_assert_eq!(usage, Decimal::ZERO);
        }
    }
}
