//! Size, price and settlement-invariant checks shared by every entry point
//! that creates or matches an order.

use crate::error::CoreError;

/// Reject orders outside the configured size bounds. `amount` is already in
/// kopecks (converted at the boundary from the major-unit request amount).
pub fn validate_order_size(
    amount_kopecks: i64,
    min_kopecks: i64,
    max_kopecks: i64,
) -> Result<(), CoreError> {
    if amount_kopecks < min_kopecks {
        return Err(CoreError::Validation(format!(
            "Minimum order size is {:.2}",
            min_kopecks as f64 / 100.0
        )));
    }
    if amount_kopecks > max_kopecks {
        return Err(CoreError::Validation(format!(
            "Maximum order size is {:.2}",
            max_kopecks as f64 / 100.0
        )));
    }
    Ok(())
}

/// Boundary validation for a newly-placed order's own price: prices of
/// exactly 0 or 10000 (0% / 100%) are never allowed, independent of whether
/// a counter-order happens to be compatible with them.
pub fn validate_price_bp(price_bp: i32) -> Result<(), CoreError> {
    if !(1..=9999).contains(&price_bp) {
        return Err(CoreError::Validation(
            "price must be between 0.01 and 0.99".to_string(),
        ));
    }
    Ok(())
}

/// A YES order at `p` and a NO order at `q` are compatible iff `p + q >=
/// 10000` — generalized from the reference system's exact-match check so a
/// more aggressive counter-price can still cross a resting order.
pub fn is_price_compatible(yes_price_bp: i32, no_price_bp: i32) -> bool {
    yes_price_bp + no_price_bp >= 10000
}

/// Splits a fill of `amount` kopecks at YES price `price_bp` basis points
/// into the YES and NO sides' costs. Rounding always accrues the
/// fractional part to the NO side; `yes_cost + no_cost == amount` is
/// asserted here and re-checked by the stored CHECK constraint on `trades`.
pub fn calculate_settlement(amount_kopecks: i64, yes_price_bp: i32) -> Result<(i64, i64), CoreError> {
    let yes_cost = (amount_kopecks as i128 * yes_price_bp as i128 / 10_000) as i64;
    let no_cost = amount_kopecks - yes_cost;

    if yes_cost + no_cost != amount_kopecks || yes_cost < 0 || no_cost < 0 {
        return Err(CoreError::Invariant(format!(
            "cost split mismatch: yes={yes_cost} no={no_cost} amount={amount_kopecks}"
        )));
    }

    Ok((yes_cost, no_cost))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_split_sums_to_amount_for_every_price() {
        for price_bp in 0..=10_000 {
            for amount in [1i64, 2, 3, 7, 100, 9999, 10_000, 1_000_001] {
                let (yes, no) = calculate_settlement(amount, price_bp).unwrap();
                assert_eq!(yes + no, amount);
                assert!(yes >= 0 && no >= 0);
            }
        }
    }

    #[test]
    fn exact_match_example_from_spec() {
        let (yes, no) = calculate_settlement(10_000, 6500).unwrap();
        assert_eq!(yes, 6500);
        assert_eq!(no, 3500);
    }

    #[test]
    fn rounding_accrues_to_no_side() {
        // amount=3, price=3334bp -> yes = floor(3*3334/10000) = 1, no = 2
        let (yes, no) = calculate_settlement(3, 3334).unwrap();
        assert_eq!(yes, 1);
        assert_eq!(no, 2);
    }

    #[test]
    fn price_compatibility_uses_generalized_ge_rule() {
        assert!(is_price_compatible(6500, 3500)); // exact complement
        assert!(is_price_compatible(6500, 4000)); // more aggressive NO still crosses
        assert!(!is_price_compatible(6500, 3000)); // not enough
    }

    #[test]
    fn boundary_prices_are_rejected() {
        assert!(validate_price_bp(0).is_err());
        assert!(validate_price_bp(10_000).is_err());
        assert!(validate_price_bp(1).is_ok());
        assert!(validate_price_bp(9999).is_ok());
    }

    #[test]
    fn order_size_bounds_are_enforced() {
        assert!(validate_order_size(99, 100, 100_000_000).is_err());
        assert!(validate_order_size(100_000_001, 100, 100_000_000).is_err());
        assert!(validate_order_size(100, 100, 100_000_000).is_ok());
    }
}
