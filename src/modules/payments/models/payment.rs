use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Payment lifecycle; everything except `pending` is terminal and absorbs
/// replayed callbacks as no-ops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Cancelled => write!(f, "cancelled"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// Gateway callback outcome; the three webhook endpoints map onto this
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackOutcome {
    Success,
    Fail,
    Cancel,
}

impl CallbackOutcome {
    /// Payment status this outcome resolves to
    pub fn payment_status(&self) -> PaymentStatus {
        match self {
            CallbackOutcome::Success => PaymentStatus::Paid,
            CallbackOutcome::Fail => PaymentStatus::Failed,
            CallbackOutcome::Cancel => PaymentStatus::Cancelled,
        }
    }
}

/// Payment record, one-to-one with its order.
///
/// `raw_payload` stores the gateway's callback body verbatim for audit.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub gateway_id: String,
    pub tran_id: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub session_key: Option<String>,
    pub raw_payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_only_pending_is_non_terminal() {
        assert!(!PaymentStatus::Pending.is_terminal());
        for status in [
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Cancelled,
            PaymentStatus::Refunded,
        ] {
            assert!(status.is_terminal());
        }
    }

    #[test]
    fn test_callback_outcomes_are_mutually_exclusive() {
        assert_eq!(CallbackOutcome::Success.payment_status(), PaymentStatus::Paid);
        assert_eq!(CallbackOutcome::Fail.payment_status(), PaymentStatus::Failed);
        assert_eq!(
            CallbackOutcome::Cancel.payment_status(),
            PaymentStatus::Cancelled
        );
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Cancelled,
            PaymentStatus::Refunded,
        ] {
            assert_eq!(PaymentStatus::from_str(&status.to_string()).unwrap(), status);
        }
    }
}
