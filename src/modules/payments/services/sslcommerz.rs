use super::gateway_trait::{PaymentGateway, SessionRequest, SessionResponse};
use crate::config::GatewayConfig;
use crate::core::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// SSLCommerz hosted-checkout client.
///
/// Session creation posts the order summary to the v4 gateway endpoint and
/// returns the `GatewayPageURL` the customer is redirected to. The sandbox
/// and live APIs share the wire format; only credentials and base URL
/// differ.
pub struct SslCommerzClient {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl SslCommerzClient {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| {
                AppError::Configuration(format!("Failed to build gateway client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    fn session_endpoint(&self) -> String {
        format!("{}/gwprocess/v4/api.php", self.config.base_url)
    }
}

/// Response shape of the session-creation endpoint; unknown fields ignored
#[derive(Debug, Deserialize)]
struct SslCommerzSessionResponse {
    status: String,
    #[serde(default)]
    sessionkey: String,
    #[serde(default, rename = "GatewayPageURL")]
    gateway_page_url: String,
    #[serde(default)]
    failedreason: String,
}

#[async_trait]
impl PaymentGateway for SslCommerzClient {
    async fn create_session(&self, request: SessionRequest) -> Result<SessionResponse> {
        let amount = request.amount.round_dp(2).to_string();
        let num_items = request.num_items.to_string();

        let form: Vec<(&str, &str)> = vec![
            ("store_id", self.config.store_id.as_str()),
            ("store_passwd", self.config.store_password.as_str()),
            ("total_amount", amount.as_str()),
            ("currency", "BDT"),
            ("tran_id", request.tran_id.as_str()),
            ("success_url", request.success_url.as_str()),
            ("fail_url", request.fail_url.as_str()),
            ("cancel_url", request.cancel_url.as_str()),
            ("emi_option", "0"),
            ("cus_name", request.customer_name.as_str()),
            ("cus_email", request.customer_email.as_str()),
            ("cus_phone", request.customer_phone.as_str()),
            ("cus_add1", request.customer_city.as_str()),
            ("cus_city", request.customer_city.as_str()),
            ("cus_country", "Bangladesh"),
            ("shipping_method", "NO"),
            ("num_of_item", num_items.as_str()),
            ("product_name", request.product_name.as_str()),
            ("product_category", request.product_category.as_str()),
            ("product_profile", "general"),
        ];

        let response = self
            .client
            .post(self.session_endpoint())
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    AppError::gateway(format!(
                        "SSLCommerz gateway unavailable: {} ({})",
                        if e.is_timeout() { "timeout" } else { "connection failed" },
                        e
                    ))
                } else {
                    AppError::gateway(format!("SSLCommerz API request failed: {}", e))
                }
            })?;

        let status_code = response.status();
        let response_body = response.text().await.map_err(|e| {
            AppError::gateway(format!("Failed to read SSLCommerz response: {}", e))
        })?;

        if !status_code.is_success() {
            return Err(AppError::gateway(format!(
                "SSLCommerz API error - HTTP {} ({})",
                status_code.as_u16(),
                response_body
            )));
        }

        let session: SslCommerzSessionResponse = serde_json::from_str(&response_body)
            .map_err(|e| AppError::gateway(format!("Failed to parse SSLCommerz response: {}", e)))?;

        if !session.status.eq_ignore_ascii_case("success") {
            return Err(AppError::gateway(format!(
                "SSLCommerz session rejected: {} ({})",
                session.status, session.failedreason
            )));
        }

        if session.gateway_page_url.is_empty() {
            return Err(AppError::gateway(
                "SSLCommerz session succeeded without a GatewayPageURL",
            ));
        }

        Ok(SessionResponse {
            session_key: session.sessionkey,
            redirect_url: session.gateway_page_url,
        })
    }

    fn name(&self) -> &str {
        "sslcommerz"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_response_parsing() {
        let body = r#"{
            "status": "SUCCESS",
            "sessionkey": "C3CA415A6A1CB0B16C4CAF05C36CDBB1",
            "GatewayPageURL": "https://sandbox.sslcommerz.com/EasyCheckOut/test"
        }"#;

        let parsed: SslCommerzSessionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.status, "SUCCESS");
        assert!(parsed.gateway_page_url.contains("EasyCheckOut"));
        assert!(parsed.failedreason.is_empty());
    }

    #[test]
    fn test_failed_session_parsing() {
        let body = r#"{"status": "FAILED", "failedreason": "Invalid credentials"}"#;

        let parsed: SslCommerzSessionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.status, "FAILED");
        assert_eq!(parsed.failedreason, "Invalid credentials");
        assert!(parsed.gateway_page_url.is_empty());
    }
}
