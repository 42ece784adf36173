//! Conversions between the major-unit `Decimal` the HTTP boundary speaks and
//! the integer minor units (kopecks, basis points) the core operates on.

use rust_decimal::Decimal;

use crate::error::CoreError;

/// `1.00` -> `100` kopecks. Rejects non-positive or sub-kopeck amounts.
pub fn decimal_to_kopecks(amount: Decimal) -> Result<i64, CoreError> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::Validation("amount must be positive".to_string()));
    }
    let scaled = amount * Decimal::new(100, 0);
    if scaled.fract() != Decimal::ZERO {
        return Err(CoreError::Validation(
            "amount cannot be more precise than 0.01".to_string(),
        ));
    }
    scaled
        .to_string()
        .parse::<i64>()
        .map_err(|_| CoreError::Validation("amount out of range".to_string()))
}

pub fn kopecks_to_decimal(kopecks: i64) -> Decimal {
    Decimal::new(kopecks, 2)
}

/// `0.65` -> `6500` bp. Rejects anything outside `(0.0, 1.0)` or finer than
/// one basis point.
pub fn decimal_to_price_bp(price: Decimal) -> Result<i32, CoreError> {
    if price <= Decimal::ZERO || price >= Decimal::ONE {
        return Err(CoreError::Validation(
            "price must be between 0.01 and 0.99".to_string(),
        ));
    }
    let scaled = price * Decimal::new(10_000, 0);
    if scaled.fract() != Decimal::ZERO {
        return Err(CoreError::Validation(
            "price cannot be more precise than one basis point".to_string(),
        ));
    }
    scaled
        .to_string()
        .parse::<i32>()
        .map_err(|_| CoreError::Validation("price out of range".to_string()))
}

pub fn price_bp_to_decimal(price_bp: i32) -> Decimal {
    Decimal::new(price_bp as i64, 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn converts_whole_rubles() {
        assert_eq!(decimal_to_kopecks(dec!(1.00)).unwrap(), 100);
        assert_eq!(decimal_to_kopecks(dec!(12.34)).unwrap(), 1234);
    }

    #[test]
    fn rejects_sub_kopeck_amounts() {
        assert!(decimal_to_kopecks(dec!(1.005)).is_err());
    }

    #[test]
    fn rejects_non_positive_amounts() {
        assert!(decimal_to_kopecks(dec!(0)).is_err());
        assert!(decimal_to_kopecks(dec!(-1)).is_err());
    }

    #[test]
    fn converts_price_to_basis_points() {
        assert_eq!(decimal_to_price_bp(dec!(0.65)).unwrap(), 6500);
    }

    #[test]
    fn rejects_boundary_prices() {
        assert!(decimal_to_price_bp(dec!(0)).is_err());
        assert!(decimal_to_price_bp(dec!(1)).is_err());
    }

    #[test]
    fn roundtrips_through_decimal() {
        assert_eq!(price_bp_to_decimal(6500), dec!(0.6500));
        assert_eq!(kopecks_to_decimal(1234), dec!(12.34));
    }
}
