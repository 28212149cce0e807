use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Shopping cart; exactly one active cart per user at a time
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product entry inside a cart.
///
/// `unit_price` is a snapshot taken when the line was added; later product
/// price edits do not touch it. `prescription_request_id` is set when the
/// line came from an approved prescription (weak reference).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartItem {
    pub id: String,
    pub cart_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub prescription_request_id: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// Cart line joined with display fields from the product row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartItemView {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub product_slug: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub prescription_request_id: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl CartItemView {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Totals computed from the snapshot prices, not from current product prices
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub total_items: usize,
    pub total_quantity: u64,
    pub total_price: Decimal,
}

pub fn cart_totals(items: &[CartItemView]) -> CartTotals {
    CartTotals {
        total_items: items.len(),
        total_quantity: items.iter().map(|i| u64::from(i.quantity)).sum(),
        total_price: items.iter().map(CartItemView::line_total).sum(),
    }
}

/// Full cart response
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub id: String,
    pub items: Vec<CartItemView>,
    #[serde(flatten)]
    pub totals: CartTotals,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(product_id: &str, quantity: u32, unit_price: Decimal) -> CartItemView {
        CartItemView {
            id: format!("item-{}", product_id),
            product_id: product_id.to_string(),
            product_name: format!("Product {}", product_id),
            product_slug: format!("product-{}", product_id),
            quantity,
            unit_price,
            prescription_request_id: None,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_totals_sum_snapshot_prices() {
        let items = vec![item("a", 2, dec!(100.00)), item("b", 1, dec!(50.00))];
        let totals = cart_totals(&items);

        assert_eq!(totals.total_items, 2);
        assert_eq!(totals.total_quantity, 3);
        assert_eq!(totals.total_price, dec!(250.00));
    }

    #[test]
    fn test_totals_of_empty_cart() {
        let totals = cart_totals(&[]);
        assert_eq!(totals.total_items, 0);
        assert_eq!(totals.total_quantity, 0);
        assert_eq!(totals.total_price, Decimal::ZERO);
    }

    #[test]
    fn test_add_item_request_defaults_to_one() {
        let request: AddItemRequest =
            serde_json::from_str(r#"{"product_id": "p-1"}"#).unwrap();
        assert_eq!(request.quantity, 1);
    }
}
