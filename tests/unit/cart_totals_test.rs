// Cart totals are computed from the price snapshots taken at add time,
// never from current product prices.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use medikart::carts::models::{cart_totals, CartItemView};

fn item(product: &str, quantity: u32, unit_price: Decimal) -> CartItemView {
    CartItemView {
        id: format!("item-{}", product),
        product_id: product.to_string(),
        product_name: format!("Product {}", product),
        product_slug: format!("product-{}", product),
        quantity,
        unit_price,
        prescription_request_id: None,
        added_at: Utc::now(),
    }
}

#[test]
fn test_line_total_multiplies_snapshot_price() {
    let line = item("a", 3, dec!(33.50));
    assert_eq!(line.line_total(), dec!(100.50));
}

#[test]
fn test_totals_across_lines() {
    let items = vec![
        item("a", 2, dec!(100.00)),
        item("b", 1, dec!(50.00)),
        item("c", 4, dec!(12.25)),
    ];

    let totals = cart_totals(&items);
    assert_eq!(totals.total_items, 3);
    assert_eq!(totals.total_quantity, 7);
    assert_eq!(totals.total_price, dec!(299.00));
}

#[test]
fn test_empty_cart_totals() {
    let totals = cart_totals(&[]);
    assert_eq!(totals.total_items, 0);
    assert_eq!(totals.total_quantity, 0);
    assert_eq!(totals.total_price, Decimal::ZERO);
}

#[test]
fn test_prescription_tagged_lines_count_like_any_other() {
    let mut line = item("rx", 2, dec!(75.00));
    line.prescription_request_id = Some("req-1".to_string());

    let totals = cart_totals(&[line]);
    assert_eq!(totals.total_quantity, 2);
    assert_eq!(totals.total_price, dec!(150.00));
}
