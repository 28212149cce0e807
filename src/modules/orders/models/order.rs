use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::order_item::OrderItem;
use crate::modules::payments::models::PaymentStatus;

/// Fulfillment lifecycle, independent of the payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Forward progression plus cancellation from any non-terminal state
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == OrderStatus::Cancelled {
            return true;
        }

        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Confirmed, OrderStatus::Processing)
                | (OrderStatus::Processing, OrderStatus::Shipped)
                | (OrderStatus::Shipped, OrderStatus::Delivered)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Confirmed => write!(f, "confirmed"),
            OrderStatus::Processing => write!(f, "processing"),
            OrderStatus::Shipped => write!(f, "shipped"),
            OrderStatus::Delivered => write!(f, "delivered"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// How the order is paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(10)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery; paid immediately, no external call
    Cod,
    /// Hosted gateway checkout; paid when the success callback arrives
    Gateway,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cod => write!(f, "cod"),
            PaymentMethod::Gateway => write!(f, "gateway"),
        }
    }
}

/// Immutable order snapshot.
///
/// Item names, prices, and subtotals are duplicated from the cart at order
/// time so later product edits do not alter history.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub user_id: String,
    pub shipping_name: String,
    pub shipping_phone: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub payment_method: PaymentMethod,
    pub tran_id: String,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order with its snapshot lines
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShippingInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderRequest {
    pub shipping: ShippingInfo,
    pub payment_method: PaymentMethod,
}

/// Placement result; `redirect_url` is set for gateway orders and the
/// caller forwards the customer there to pay
#[derive(Debug, Clone, Serialize)]
pub struct PlaceOrderResponse {
    #[serde(flatten)]
    pub order: OrderView,
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Human-readable unique order number: date plus a random suffix, with the
/// database unique key as the collision backstop
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..0x1000000);
    format!("MK-{}-{:06X}", now.format("%Y%m%d"), suffix)
}

/// Gateway transaction id, unique per order
pub fn generate_tran_id(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..0x10000000);
    format!("TXN{}{:07X}", now.format("%Y%m%d%H%M%S"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn test_skipping_states_rejected() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Confirmed));
    }

    #[test]
    fn test_cancellation_from_non_terminal_only() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Confirmed));
    }

    #[test]
    fn test_order_number_format() {
        let now = Utc::now();
        let number = generate_order_number(now);
        assert!(number.starts_with("MK-"));
        assert_eq!(number.len(), "MK-".len() + 8 + 1 + 6);
        assert_ne!(generate_order_number(now), generate_order_number(now));
    }

    #[test]
    fn test_tran_id_uniqueness_between_calls() {
        let now = Utc::now();
        assert_ne!(generate_tran_id(now), generate_tran_id(now));
    }
}
