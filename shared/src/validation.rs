//! Validation utilities for the Production Costing Platform
//!
//! Pure checks shared by the costing pipeline and the request layer.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Validate that a margin is a fraction strictly between 0 and 1
pub fn validate_margin_fraction(margin: Decimal) -> Result<(), &'static str> {
    if margin <= Decimal::ZERO || margin >= Decimal::ONE {
        return Err("Margin must be a fraction between 0 and 1 (exclusive)");
    }
    Ok(())
}

/// Validate that a selling price is strictly positive
pub fn validate_selling_price(price: Decimal) -> Result<(), &'static str> {
    if price <= Decimal::ZERO {
        return Err("Selling price must be greater than 0");
    }
    Ok(())
}

/// Validate that a quantity is strictly positive
pub fn validate_positive_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be greater than 0");
    }
    Ok(())
}

/// Validate that a physical count is not negative
pub fn validate_count(count: Decimal) -> Result<(), &'static str> {
    if count < Decimal::ZERO {
        return Err("Counted quantity cannot be negative");
    }
    Ok(())
}

/// Whether an effective-date window contains the given date.
/// An open bound is always satisfied on that side.
pub fn is_window_active(start: Option<NaiveDate>, end: Option<NaiveDate>, on: NaiveDate) -> bool {
    start.map_or(true, |s| s <= on) && end.map_or(true, |e| e >= on)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn margin_bounds_are_exclusive() {
        assert!(validate_margin_fraction(dec("0")).is_err());
        assert!(validate_margin_fraction(dec("1")).is_err());
        assert!(validate_margin_fraction(dec("-0.1")).is_err());
        assert!(validate_margin_fraction(dec("0.2")).is_ok());
        assert!(validate_margin_fraction(dec("0.999")).is_ok());
    }

    #[test]
    fn open_window_always_active() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert!(is_window_active(None, None, today));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

        assert!(is_window_active(Some(start), Some(end), start));
        assert!(is_window_active(Some(start), Some(end), end));
        assert!(!is_window_active(
            Some(start),
            Some(end),
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
        ));
        assert!(!is_window_active(
            Some(start),
            Some(end),
            NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()
        ));
    }
}
