use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Validation errors for business rules
    #[error("Validation error: {0}")]
    Validation(String),

    /// Order placement against an empty cart
    #[error("Cart is empty")]
    EmptyCart,

    /// Missing or invalid credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but lacking the required role or ownership
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// State conflict (acting on a row whose state forbids the operation)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Ordered quantity exceeds available stock
    #[error("Insufficient stock for product '{product}': requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: u32,
        available: u32,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Payment gateway errors
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Outbound mail delivery errors (best-effort; callers log and continue)
    #[error("Mail error: {0}")]
    Mail(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        HttpResponse::build(status_code).json(serde_json::json!({
            "error": {
                "message": error_message,
                "code": status_code.as_u16(),
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::EmptyCart => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InsufficientStock { .. } => StatusCode::CONFLICT,
            AppError::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Mail(_) => StatusCode::BAD_GATEWAY,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Helper functions for common error scenarios
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn gateway(msg: impl Into<String>) -> Self {
        AppError::Gateway(msg.into())
    }

    pub fn mail(msg: impl Into<String>) -> Self {
        AppError::Mail(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::validation("bad input").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::EmptyCart.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::forbidden("not yours").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::not_found("order").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InsufficientStock {
                product: "Napa 500".to_string(),
                requested: 2,
                available: 1,
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::gateway("session failed").status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_insufficient_stock_message() {
        let err = AppError::InsufficientStock {
            product: "Seclo 20".to_string(),
            requested: 5,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("Seclo 20"));
        assert!(msg.contains("requested 5"));
        assert!(msg.contains("available 3"));
    }
}
