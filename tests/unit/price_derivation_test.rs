// Property-based tests for product price derivation.
//
// Derivation runs on every save, so the invariants must hold for any
// (price, offer) combination:
// - new_price <= price
// - discount_price = price - new_price
// - no offer leaves the base price untouched

use proptest::prelude::*;
use rust_decimal::Decimal;

use medikart::catalog::services::pricing::{derive_prices, validate_price_inputs};

fn price_from_cents(cents: u64) -> Decimal {
    Decimal::new(cents as i64, 2)
}

proptest! {
    #[test]
    fn test_new_price_never_exceeds_price(
        cents in 0u64..1_000_000_000u64,
        offer in 0u8..=100u8
    ) {
        let price = price_from_cents(cents);
        let derived = derive_prices(price, Decimal::from(offer));

        prop_assert!(
            derived.new_price <= price,
            "new_price {} exceeds price {} at offer {}%",
            derived.new_price, price, offer
        );
    }

    #[test]
    fn test_discount_is_exactly_the_price_gap(
        cents in 0u64..1_000_000_000u64,
        offer in 0u8..=100u8
    ) {
        let price = price_from_cents(cents);
        let derived = derive_prices(price, Decimal::from(offer));

        prop_assert_eq!(derived.discount_price, price - derived.new_price);
    }

    #[test]
    fn test_zero_offer_is_identity(cents in 0u64..1_000_000_000u64) {
        let price = price_from_cents(cents);
        let derived = derive_prices(price, Decimal::ZERO);

        prop_assert_eq!(derived.new_price, price);
        prop_assert_eq!(derived.discount_price, Decimal::ZERO);
    }

    #[test]
    fn test_full_offer_discounts_everything(cents in 0u64..1_000_000_000u64) {
        let price = price_from_cents(cents);
        let derived = derive_prices(price, Decimal::from(100));

        prop_assert_eq!(derived.new_price, Decimal::ZERO);
        prop_assert_eq!(derived.discount_price, price);
    }

    #[test]
    fn test_derivation_is_deterministic(
        cents in 0u64..1_000_000_000u64,
        offer in 0u8..=100u8
    ) {
        let price = price_from_cents(cents);
        let offer = Decimal::from(offer);

        prop_assert_eq!(derive_prices(price, offer), derive_prices(price, offer));
    }

    #[test]
    fn test_deeper_offers_never_raise_the_price(
        cents in 0u64..1_000_000_000u64,
        offer_a in 0u8..=100u8,
        offer_b in 0u8..=100u8
    ) {
        let price = price_from_cents(cents);
        let (lo, hi) = if offer_a <= offer_b { (offer_a, offer_b) } else { (offer_b, offer_a) };

        let shallow = derive_prices(price, Decimal::from(lo));
        let deep = derive_prices(price, Decimal::from(hi));

        prop_assert!(deep.new_price <= shallow.new_price);
    }

    #[test]
    fn test_out_of_range_offers_rejected(offer in 101u32..10_000u32) {
        let result = validate_price_inputs(Decimal::from(100), Decimal::from(offer));
        prop_assert!(result.is_err());
    }
}

#[test]
fn test_worked_example() {
    // 200.00 at 25% off: sells at 150.00, 50.00 discount
    let derived = derive_prices(Decimal::new(20000, 2), Decimal::from(25));
    assert_eq!(derived.new_price, Decimal::new(15000, 2));
    assert_eq!(derived.discount_price, Decimal::new(5000, 2));
}
