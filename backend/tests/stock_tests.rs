//! Stock ledger tests
//!
//! Tests for balance adjustment including:
//! - Moving average cost on inbound movements
//! - Outbound movements never revaluing the average
//! - Degenerate balances (quantity driven to zero or below)

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use production_costing_backend::models::MovementType;
use production_costing_backend::services::stock::apply_stock_delta;

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

    /// Inbound with a cost re-averages against the prior quantity
    #[test]
    fn test_inbound_moving_average() {
        // 10 units at avg 5, receive 10 at 7: avg = (50 + 70) / 20 = 6
        let (qty, avg) = apply_stock_delta(dec("10.0"), dec("5.0"), dec("10.0"), Some(dec("7.0")));
        assert_eq!(qty, dec("20.0"));
        assert_eq!(avg, dec("6.0"));
    }

    /// Two equal inbound lots average their costs
    #[test]
    fn test_equal_lots_average() {
        let (qty, avg) = apply_stock_delta(Decimal::ZERO, Decimal::ZERO, dec("10.0"), Some(dec("10.0")));
        assert_eq!(avg, dec("10.0"));

        let (qty, avg) = apply_stock_delta(qty, avg, dec("10.0"), Some(dec("20.0")));
        assert_eq!(qty, dec("20.0"));
        assert_eq!(avg, dec("15.0"));
    }

    /// Outbound reduces quantity but keeps the average
    #[test]
    fn test_outbound_keeps_average() {
        let (qty, avg) = apply_stock_delta(dec("20.0"), dec("6.0"), dec("-5.0"), None);
        assert_eq!(qty, dec("15.0"));
        assert_eq!(avg, dec("6.0"));
    }

    /// Outbound keeps the average even when a cost is attached
    #[test]
    fn test_outbound_with_cost_keeps_average() {
        let (qty, avg) = apply_stock_delta(dec("20.0"), dec("6.0"), dec("-5.0"), Some(dec("9.0")));
        assert_eq!(qty, dec("15.0"));
        assert_eq!(avg, dec("6.0"));
    }

    /// Inbound without a cost keeps the prior average
    #[test]
    fn test_inbound_without_cost_keeps_average() {
        let (qty, avg) = apply_stock_delta(dec("10.0"), dec("5.0"), dec("10.0"), None);
        assert_eq!(qty, dec("20.0"));
        assert_eq!(avg, dec("5.0"));
    }

    /// Quantity driven to zero or below degenerates the average to zero
    #[test]
    fn test_degenerate_quantity_zeroes_average() {
        // Negative starting quantity, inbound with cost, still non-positive
        let (qty, avg) = apply_stock_delta(dec("-20.0"), dec("5.0"), dec("10.0"), Some(dec("7.0")));
        assert_eq!(qty, dec("-10.0"));
        assert_eq!(avg, Decimal::ZERO);

        let (qty, avg) = apply_stock_delta(dec("-10.0"), dec("5.0"), dec("10.0"), Some(dec("7.0")));
        assert_eq!(qty, Decimal::ZERO);
        assert_eq!(avg, Decimal::ZERO);
    }

    /// Quantity may go negative; the ledger records what happened
    #[test]
    fn test_quantity_may_go_negative() {
        let (qty, avg) = apply_stock_delta(dec("5.0"), dec("4.0"), dec("-8.0"), None);
        assert_eq!(qty, dec("-3.0"));
        assert_eq!(avg, dec("4.0"));
    }

    /// Inbound direction per movement type
    #[test]
    fn test_movement_type_direction() {
        assert!(MovementType::In.is_inbound());
        assert!(MovementType::VendorDelivery.is_inbound());
        assert!(MovementType::Production.is_inbound());

        assert!(!MovementType::Out.is_inbound());
        assert!(!MovementType::Sale.is_inbound());
        assert!(!MovementType::Waste.is_inbound());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating positive quantities
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1)) // 0.1 to 1000.0
    }

    /// Strategy for generating unit costs
    fn cost_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 2)) // 0.01 to 1000.00
    }

    /// Strategy for generating signed deltas with an optional cost
    fn delta_strategy() -> impl Strategy<Value = (Decimal, Option<Decimal>)> {
        prop_oneof![
            (quantity_strategy(), cost_strategy()).prop_map(|(q, c)| (q, Some(c))),
            quantity_strategy().prop_map(|q| (-q, None)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Outbound movements never change the average cost
        #[test]
        fn prop_outbound_never_revalues(
            qty in quantity_strategy(),
            avg in cost_strategy(),
            out in quantity_strategy()
        ) {
            let (_, new_avg) = apply_stock_delta(qty, avg, -out, None);
            prop_assert_eq!(new_avg, avg);
        }

        /// Folding deltas over an empty balance yields their signed sum
        #[test]
        fn prop_quantity_is_signed_sum(
            deltas in prop::collection::vec(delta_strategy(), 1..20)
        ) {
            let (final_qty, _) = deltas.iter().fold(
                (Decimal::ZERO, Decimal::ZERO),
                |(qty, avg), (delta, cost)| apply_stock_delta(qty, avg, *delta, *cost),
            );

            let expected: Decimal = deltas.iter().map(|(delta, _)| *delta).sum();
            prop_assert_eq!(final_qty, expected);
        }

        /// Averaging inbound lots from empty stays within the cost range
        #[test]
        fn prop_average_bounded_by_lot_costs(
            lots in prop::collection::vec((quantity_strategy(), cost_strategy()), 1..10)
        ) {
            let (qty, avg) = lots.iter().fold(
                (Decimal::ZERO, Decimal::ZERO),
                |(qty, avg), (lot_qty, cost)| {
                    apply_stock_delta(qty, avg, *lot_qty, Some(*cost))
                },
            );

            prop_assert!(qty > Decimal::ZERO);

            let min_cost = lots.iter().map(|(_, c)| *c).min().unwrap();
            let max_cost = lots.iter().map(|(_, c)| *c).max().unwrap();

            prop_assert!(avg >= min_cost);
            prop_assert!(avg <= max_cost);
        }

        /// The balance value identity holds for a single inbound receipt:
        /// new value = old value + received value
        #[test]
        fn prop_inbound_preserves_value(
            qty in quantity_strategy(),
            avg in cost_strategy(),
            received in quantity_strategy(),
            cost in cost_strategy()
        ) {
            let (new_qty, new_avg) = apply_stock_delta(qty, avg, received, Some(cost));

            let old_value = qty * avg;
            let received_value = received * cost;
            let new_value = new_qty * new_avg;

            let diff = (new_value - (old_value + received_value)).abs();
            prop_assert!(diff < dec("0.0001"));
        }
    }
}
