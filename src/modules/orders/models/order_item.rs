use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// Snapshot of one cart line at order time.
///
/// `unit_price` comes from the cart snapshot, `actual_price` is the cost
/// price copied for profit reporting; neither follows later product edits.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub unit_price: Decimal,
    pub actual_price: Decimal,
    pub quantity: u32,
    pub subtotal: Decimal,
}

/// Order total as the sum of line subtotals
pub fn order_total(items: &[OrderItem]) -> Decimal {
    items.iter().map(|i| i.subtotal).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(name: &str, unit_price: Decimal, quantity: u32) -> OrderItem {
        OrderItem {
            id: format!("oi-{}", name),
            order_id: "o-1".to_string(),
            product_id: format!("p-{}", name),
            product_name: name.to_string(),
            unit_price,
            actual_price: Decimal::ZERO,
            quantity,
            subtotal: unit_price * Decimal::from(quantity),
        }
    }

    #[test]
    fn test_total_sums_subtotals() {
        let items = vec![item("a", dec!(100.00), 2), item("b", dec!(50.00), 1)];
        assert_eq!(order_total(&items), dec!(250.00));
    }

    #[test]
    fn test_total_of_no_items_is_zero() {
        assert_eq!(order_total(&[]), Decimal::ZERO);
    }
}
