use crate::core::{AppError, Result};
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration.
///
/// Loaded once at startup and injected into the services that need it;
/// nothing reads credentials from ambient global state.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub mail: MailConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    /// Base URL of the storefront, used for payment redirect targets
    pub frontend_base_url: String,
    /// Base URL of this API, used to build the gateway callback URLs
    pub api_base_url: String,
}

/// SSLCommerz-style hosted checkout gateway credentials
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub store_id: String,
    pub store_password: String,
    pub base_url: String,
    pub sandbox: bool,
}

/// Outbound mail-API credentials (fire-and-forget delivery)
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
    /// Fixed mailbox that receives prescription-intake notifications
    pub admin_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub otp_ttl_minutes: i64,
    pub otp_requests_per_minute: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                frontend_base_url: env::var("FRONTEND_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:5173".to_string()),
                api_base_url: env::var("API_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            gateway: GatewayConfig {
                store_id: env::var("GATEWAY_STORE_ID")
                    .map_err(|_| AppError::Configuration("GATEWAY_STORE_ID not set".to_string()))?,
                store_password: env::var("GATEWAY_STORE_PASSWORD").map_err(|_| {
                    AppError::Configuration("GATEWAY_STORE_PASSWORD not set".to_string())
                })?,
                base_url: env::var("GATEWAY_BASE_URL")
                    .unwrap_or_else(|_| "https://sandbox.sslcommerz.com".to_string()),
                sandbox: env::var("GATEWAY_SANDBOX")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(true),
            },
            mail: MailConfig {
                api_url: env::var("MAIL_API_URL")
                    .map_err(|_| AppError::Configuration("MAIL_API_URL not set".to_string()))?,
                api_key: env::var("MAIL_API_KEY")
                    .map_err(|_| AppError::Configuration("MAIL_API_KEY not set".to_string()))?,
                from_address: env::var("MAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| "no-reply@medikart.example".to_string()),
                admin_address: env::var("MAIL_ADMIN_ADDRESS")
                    .unwrap_or_else(|_| "admin@medikart.example".to_string()),
            },
            security: SecurityConfig {
                access_token_ttl_minutes: env::var("ACCESS_TOKEN_TTL_MINUTES")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration("Invalid ACCESS_TOKEN_TTL_MINUTES".to_string())
                    })?,
                refresh_token_ttl_days: env::var("REFRESH_TOKEN_TTL_DAYS")
                    .unwrap_or_else(|_| "7".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration("Invalid REFRESH_TOKEN_TTL_DAYS".to_string())
                    })?,
                otp_ttl_minutes: env::var("OTP_TTL_MINUTES")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .map_err(|_| AppError::Configuration("Invalid OTP_TTL_MINUTES".to_string()))?,
                otp_requests_per_minute: env::var("OTP_REQUESTS_PER_MINUTE")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .map_err(|_| {
                        AppError::Configuration("Invalid OTP_REQUESTS_PER_MINUTE".to_string())
                    })?,
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.security.access_token_ttl_minutes <= 0 {
            return Err(AppError::Configuration(
                "Access token TTL must be greater than 0".to_string(),
            ));
        }

        if self.security.refresh_token_ttl_days <= 0 {
            return Err(AppError::Configuration(
                "Refresh token TTL must be greater than 0".to_string(),
            ));
        }

        if self.security.otp_ttl_minutes <= 0 {
            return Err(AppError::Configuration(
                "OTP TTL must be greater than 0".to_string(),
            ));
        }

        if self.security.otp_requests_per_minute == 0 {
            return Err(AppError::Configuration(
                "OTP rate limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
