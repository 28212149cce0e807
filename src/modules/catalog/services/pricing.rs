use crate::core::{AppError, Result};
use rust_decimal::Decimal;

/// Upload ceiling for catalog and prescription images (2 MB)
pub const MAX_IMAGE_BYTES: u64 = 2 * 1024 * 1024;

/// Prices derived from the base price and offer percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedPrices {
    pub new_price: Decimal,
    pub discount_price: Decimal,
}

/// Derive the selling and discount prices from a base price and an offer
/// percentage.
///
/// `new_price = price - price * offer_percentage / 100`
/// `discount_price = price - new_price`
///
/// Without an offer the selling price equals the base price and the discount
/// is zero. Pure; callers run it before every persist, never as a storage
/// hook.
pub fn derive_prices(price: Decimal, offer_percentage: Decimal) -> DerivedPrices {
    if offer_percentage > Decimal::ZERO {
        let new_price = (price - price * offer_percentage / Decimal::from(100)).round_dp(2);
        DerivedPrices {
            new_price,
            discount_price: price - new_price,
        }
    } else {
        DerivedPrices {
            new_price: price,
            discount_price: Decimal::ZERO,
        }
    }
}

/// Validate price inputs before derivation
pub fn validate_price_inputs(price: Decimal, offer_percentage: Decimal) -> Result<()> {
    if price < Decimal::ZERO {
        return Err(AppError::validation("Price cannot be negative"));
    }

    if offer_percentage < Decimal::ZERO || offer_percentage > Decimal::from(100) {
        return Err(AppError::validation(
            "Offer percentage must be between 0 and 100",
        ));
    }

    Ok(())
}

/// Reject images above the upload ceiling
pub fn validate_image_size(size_bytes: u64) -> Result<()> {
    if size_bytes > MAX_IMAGE_BYTES {
        return Err(AppError::validation("Image size must be 2 MB or less."));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_prices_with_offer() {
        let derived = derive_prices(Decimal::new(20000, 2), Decimal::new(25, 0)); // 200.00, 25%
        assert_eq!(derived.new_price, Decimal::new(15000, 2)); // 150.00
        assert_eq!(derived.discount_price, Decimal::new(5000, 2)); // 50.00
    }

    #[test]
    fn test_derive_prices_without_offer() {
        let derived = derive_prices(Decimal::new(9950, 2), Decimal::ZERO);
        assert_eq!(derived.new_price, Decimal::new(9950, 2));
        assert_eq!(derived.discount_price, Decimal::ZERO);
    }

    #[test]
    fn test_derived_invariants_hold() {
        let price = Decimal::new(33333, 2); // 333.33
        let derived = derive_prices(price, Decimal::new(10, 0));
        assert!(derived.new_price <= price);
        assert_eq!(derived.discount_price, price - derived.new_price);
    }

    #[test]
    fn test_validate_price_inputs() {
        assert!(validate_price_inputs(Decimal::new(100, 0), Decimal::new(50, 0)).is_ok());
        assert!(validate_price_inputs(Decimal::new(-1, 0), Decimal::ZERO).is_err());
        assert!(validate_price_inputs(Decimal::new(100, 0), Decimal::new(101, 0)).is_err());
    }

    #[test]
    fn test_image_ceiling() {
        assert!(validate_image_size(MAX_IMAGE_BYTES).is_ok());
        assert!(validate_image_size(MAX_IMAGE_BYTES + 1).is_err());
    }
}
