// Order snapshot arithmetic and the two status machines.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use medikart::orders::models::{
    generate_order_number, generate_tran_id, order_total, OrderItem, OrderStatus,
};
use medikart::payments::models::{CallbackOutcome, PaymentStatus};

fn snapshot(product: &str, unit_price: Decimal, quantity: u32) -> OrderItem {
    OrderItem {
        id: format!("oi-{}", product),
        order_id: "o-1".to_string(),
        product_id: format!("p-{}", product),
        product_name: product.to_string(),
        unit_price,
        actual_price: dec!(1.00),
        quantity,
        subtotal: unit_price * Decimal::from(quantity),
    }
}

#[test]
fn test_two_line_order_totals_250() {
    // {Product A: qty 2 @ 100, Product B: qty 1 @ 50} => 250
    let items = vec![
        snapshot("Product A", dec!(100.00), 2),
        snapshot("Product B", dec!(50.00), 1),
    ];

    assert_eq!(items.len(), 2);
    assert_eq!(order_total(&items), dec!(250.00));
    assert_eq!(items[0].subtotal, dec!(200.00));
    assert_eq!(items[1].subtotal, dec!(50.00));
}

#[test]
fn test_order_numbers_are_unique_and_dated() {
    let now = Utc::now();
    let a = generate_order_number(now);
    let b = generate_order_number(now);

    assert!(a.starts_with("MK-"));
    assert_ne!(a, b);

    let date_part = &a[3..11];
    assert!(date_part.chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn test_tran_ids_are_unique() {
    let now = Utc::now();
    assert_ne!(generate_tran_id(now), generate_tran_id(now));
    assert!(generate_tran_id(now).starts_with("TXN"));
}

#[test]
fn test_fulfillment_progression() {
    let happy_path = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    for pair in happy_path.windows(2) {
        assert!(
            pair[0].can_transition_to(pair[1]),
            "{} -> {} should be allowed",
            pair[0],
            pair[1]
        );
    }

    assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
    assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
    assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
}

#[test]
fn test_payment_terminality() {
    assert!(!PaymentStatus::Pending.is_terminal());
    assert!(PaymentStatus::Paid.is_terminal());
    assert!(PaymentStatus::Failed.is_terminal());
    assert!(PaymentStatus::Cancelled.is_terminal());
    assert!(PaymentStatus::Refunded.is_terminal());
}

#[test]
fn test_callback_outcome_mapping() {
    assert_eq!(CallbackOutcome::Success.payment_status(), PaymentStatus::Paid);
    assert_eq!(CallbackOutcome::Fail.payment_status(), PaymentStatus::Failed);
    assert_eq!(CallbackOutcome::Cancel.payment_status(), PaymentStatus::Cancelled);
}
