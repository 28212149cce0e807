use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account role; `Admin` doubles as the prescription reviewer role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(10)", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            _ => Err(format!("Invalid user role: {}", s)),
        }
    }
}

/// Account record; `password_hash` never leaves this module
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub city: String,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub password_hash: String,
    pub is_verified: bool,
    pub is_active: bool,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Safe representation for API responses
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            gender: self.gender.clone(),
            city: self.city.clone(),
            date_of_birth: self.date_of_birth,
            address: self.address.clone(),
            is_verified: self.is_verified,
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub city: String,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub is_verified: bool,
    pub role: UserRole,
}

/// One-time verification code; a single live code per user
#[derive(Debug, Clone, FromRow)]
pub struct EmailOtp {
    pub user_id: String,
    pub otp_code: String,
    pub created_at: DateTime<Utc>,
}

impl EmailOtp {
    pub fn is_expired(&self, ttl_minutes: i64) -> bool {
        Utc::now() > self.created_at + chrono::Duration::minutes(ttl_minutes)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default = "default_gender")]
    pub gender: String,
    #[serde(default)]
    pub city: String,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub password: String,
    pub password2: String,
}

fn default_gender() -> String {
    "Other".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResendOtpRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub city: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_expiry_window() {
        let fresh = EmailOtp {
            user_id: "u-1".to_string(),
            otp_code: "123456".to_string(),
            created_at: Utc::now(),
        };
        assert!(!fresh.is_expired(5));

        let stale = EmailOtp {
            user_id: "u-1".to_string(),
            otp_code: "123456".to_string(),
            created_at: Utc::now() - chrono::Duration::minutes(6),
        };
        assert!(stale.is_expired(5));
    }

    #[test]
    fn test_role_round_trip() {
        use std::str::FromStr;
        assert_eq!(UserRole::from_str("admin").unwrap(), UserRole::Admin);
        assert_eq!(UserRole::User.to_string(), "user");
        assert!(UserRole::from_str("root").is_err());
    }

    #[test]
    fn test_profile_omits_password_hash() {
        let user = User {
            id: "u-1".to_string(),
            full_name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            phone: "01700000000".to_string(),
            gender: "Other".to_string(),
            city: "Dhaka".to_string(),
            date_of_birth: None,
            address: None,
            password_hash: "secret-hash".to_string(),
            is_verified: true,
            is_active: true,
            role: UserRole::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user.profile()).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("test@example.com"));
    }
}
