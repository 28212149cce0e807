// Report aggregation is a pure function of the paid-order rows: running it
// twice over unchanged data must yield byte-identical output.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use medikart::reports::models::{aggregate_paid_items, PaidItemRow};
use medikart::reports::services::products_csv;

fn row(
    order_id: &str,
    product: &str,
    quantity: u32,
    unit_price: Decimal,
    actual_price: Decimal,
) -> PaidItemRow {
    PaidItemRow {
        order_id: order_id.to_string(),
        product_name: product.to_string(),
        quantity,
        unit_price,
        actual_price,
        subtotal: unit_price * Decimal::from(quantity),
    }
}

fn sample_rows() -> Vec<PaidItemRow> {
    vec![
        row("o-1", "Napa 500", 2, dec!(100.00), dec!(60.00)),
        row("o-1", "Seclo 20", 1, dec!(50.00), dec!(30.00)),
        row("o-2", "Napa 500", 3, dec!(100.00), dec!(60.00)),
        row("o-3", "Zinc B", 10, dec!(8.00), dec!(5.00)),
    ]
}

#[test]
fn test_income_profit_and_counts() {
    let totals = aggregate_paid_items(&sample_rows());

    // income: 200 + 50 + 300 + 80
    assert_eq!(totals.total_income, dec!(630.00));
    // profit: 80 + 20 + 120 + 30
    assert_eq!(totals.total_profit, dec!(250.00));
    assert_eq!(totals.total_orders, 3);
    assert_eq!(totals.total_products_sold, 16);
}

#[test]
fn test_top_product_by_quantity() {
    let totals = aggregate_paid_items(&sample_rows());
    assert_eq!(totals.top_product.as_deref(), Some("Zinc B"));
}

#[test]
fn test_recompute_is_byte_identical() {
    let rows = sample_rows();

    let first = aggregate_paid_items(&rows);
    let second = aggregate_paid_items(&rows);

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[test]
fn test_row_order_does_not_change_output() {
    let mut rows = sample_rows();
    let forward = aggregate_paid_items(&rows);
    rows.reverse();
    let backward = aggregate_paid_items(&rows);

    assert_eq!(
        serde_json::to_vec(&forward).unwrap(),
        serde_json::to_vec(&backward).unwrap()
    );
}

#[test]
fn test_breakdown_feeds_csv_export() {
    let totals = aggregate_paid_items(&sample_rows());
    let csv = products_csv(&totals.products_details).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "product,quantity,income,profit");
    // one line per product, sorted by name
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("Napa 500,5,"));
    assert!(lines[2].starts_with("Seclo 20,1,"));
    assert!(lines[3].starts_with("Zinc B,10,"));
}
