//! Standard cost and variance tests
//!
//! Tests for standard resolution and the signed variance arithmetic
//! recorded against the active standard.

use chrono::Utc;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use production_costing_backend::error::AppError;
use production_costing_backend::models::StandardCostSnapshot;
use production_costing_backend::services::standard_cost::require_standard;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn snapshot(tcop: &str) -> StandardCostSnapshot {
    StandardCostSnapshot {
        id: Uuid::new_v4(),
        business_id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        recipe_cost: dec("20.0"),
        packaging_cost: dec("5.0"),
        labour_cost: Decimal::ZERO,
        opex_cost: Decimal::ZERO,
        cogs: dec("25.0"),
        tcop: dec(tcop),
        margin_percent: Some(dec("0.2")),
        selling_price: None,
        created_at: Utc::now(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// A product with no recorded standard cannot have its variance
    /// recomputed; the absence surfaces as NotFound
    #[test]
    fn test_missing_standard_is_not_found() {
        let result = require_standard(None);

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    /// An existing standard passes through untouched
    #[test]
    fn test_existing_standard_passes_through() {
        let standard = snapshot("25.0");
        let expected_id = standard.id;

        let resolved = require_standard(Some(standard)).unwrap();
        assert_eq!(resolved.id, expected_id);
        assert_eq!(resolved.tcop, dec("25.0"));
    }

    /// Variance is actual minus standard: positive means the actual cost
    /// drifted above the standard
    #[test]
    fn test_variance_sign_convention() {
        let standard = snapshot("25.0");
        let actual_tcop = dec("28.5");

        let variance_total = actual_tcop - standard.tcop;
        assert_eq!(variance_total, dec("3.5"));

        let cheaper_tcop = dec("22.0");
        assert_eq!(cheaper_tcop - standard.tcop, dec("-3.0"));
    }

    /// Component variances sum to the total when the components do
    #[test]
    fn test_component_variances_sum_to_total() {
        let standard = snapshot("25.0");

        let actual_recipe = dec("22.0");
        let actual_packaging = dec("4.0");
        let actual_labour = dec("1.5");
        let actual_opex = dec("0.5");
        let actual_tcop = actual_recipe + actual_packaging + actual_labour + actual_opex;

        let variance_total = actual_tcop - standard.tcop;
        let component_sum = (actual_recipe - standard.recipe_cost)
            + (actual_packaging - standard.packaging_cost)
            + (actual_labour - standard.labour_cost)
            + (actual_opex - standard.opex_cost);

        assert_eq!(variance_total, component_sum);
        assert_eq!(variance_total, dec("3.0"));
    }
}
