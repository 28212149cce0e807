use crate::core::{Currency, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Hosted-checkout payment gateway boundary
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a checkout session and return the customer redirect URL
    async fn create_session(&self, request: SessionRequest) -> Result<SessionResponse>;

    /// Gateway identifier recorded on payments
    fn name(&self) -> &str;
}

/// Session-creation request data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Unique transaction id for this payment attempt
    pub tran_id: String,

    /// Payment amount
    pub amount: Decimal,

    /// Currency
    pub currency: Currency,

    /// Callback URLs the gateway redirects the customer to
    pub success_url: String,
    pub fail_url: String,
    pub cancel_url: String,

    /// Customer info
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_city: String,

    /// Product summary shown on the hosted page
    pub product_name: String,
    pub product_category: String,
    pub num_items: u32,
}

/// Session-creation response from the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Gateway session reference
    pub session_key: String,

    /// Hosted checkout URL for the customer
    pub redirect_url: String,
}
