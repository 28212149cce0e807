use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::modules::catalog::models::ImageUpload;

/// Prescription request lifecycle: `pending` is the only non-terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(20)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionStatus {
    Pending,
    Approved,
    Rejected,
}

impl PrescriptionStatus {
    /// Approved and rejected are terminal; a request reaches one of them
    /// exactly once and further transition attempts are absorbed as no-ops
    pub fn is_terminal(&self) -> bool {
        matches!(self, PrescriptionStatus::Approved | PrescriptionStatus::Rejected)
    }
}

impl std::fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrescriptionStatus::Pending => write!(f, "pending"),
            PrescriptionStatus::Approved => write!(f, "approved"),
            PrescriptionStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for PrescriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PrescriptionStatus::Pending),
            "approved" => Ok(PrescriptionStatus::Approved),
            "rejected" => Ok(PrescriptionStatus::Rejected),
            _ => Err(format!("Invalid prescription status: {}", s)),
        }
    }
}

/// Uploaded prescription awaiting admin review
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PrescriptionRequest {
    pub id: String,
    pub user_id: String,
    pub status: PrescriptionStatus,
    pub upload_url: Option<String>,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub auto_add_to_cart: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Individual item (product + quantity) contained in a request
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PrescriptionItem {
    pub id: String,
    pub prescription_request_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub note: Option<String>,
}

/// Request item joined with product display fields
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PrescriptionItemView {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: u32,
    pub note: Option<String>,
}

/// Full request response
#[derive(Debug, Clone, Serialize)]
pub struct PrescriptionView {
    #[serde(flatten)]
    pub request: PrescriptionRequest,
    pub items: Vec<PrescriptionItemView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrescriptionItemInput {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub note: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitPrescriptionRequest {
    pub items: Vec<PrescriptionItemInput>,
    pub upload: Option<ImageUpload>,
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub auto_add_to_cart: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReviewRequest {
    pub admin_notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_only_pending_is_non_terminal() {
        assert!(!PrescriptionStatus::Pending.is_terminal());
        assert!(PrescriptionStatus::Approved.is_terminal());
        assert!(PrescriptionStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            PrescriptionStatus::Pending,
            PrescriptionStatus::Approved,
            PrescriptionStatus::Rejected,
        ] {
            assert_eq!(
                PrescriptionStatus::from_str(&status.to_string()).unwrap(),
                status
            );
        }
        assert!(PrescriptionStatus::from_str("cancelled").is_err());
    }

    #[test]
    fn test_submit_defaults() {
        let request: SubmitPrescriptionRequest = serde_json::from_str(
            r#"{"items": [{"product_id": "p-1"}]}"#,
        )
        .unwrap();
        assert!(request.auto_add_to_cart);
        assert_eq!(request.items[0].quantity, 1);
    }
}
