use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use chrono::{Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::core::{AppError, Result};
use crate::middleware::auth::hash_token;
use crate::modules::notifications::Mailer;
use crate::modules::users::models::{
    AuthToken, RegisterRequest, TokenPair, UpdateProfileRequest, User, UserProfile, UserRole,
};
use crate::modules::users::repositories::{TokenRepository, UserRepository};

/// Registration, OTP verification, and token lifecycle.
///
/// Mirrors the storefront flow: register creates an inactive account and
/// mails a 6-digit code; verification activates it; login issues an opaque
/// access/refresh pair.
pub struct AuthService {
    user_repo: UserRepository,
    token_repo: TokenRepository,
    mailer: Arc<dyn Mailer>,
    security: SecurityConfig,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        token_repo: TokenRepository,
        mailer: Arc<dyn Mailer>,
        security: SecurityConfig,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            mailer,
            security,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile> {
        validate_phone(&request.phone)?;
        validate_password(&request.password, &request.password2)?;

        let email = request.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::validation("A valid email address is required"));
        }

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::validation(format!(
                "Account with email '{}' already exists",
                email
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            full_name: request.full_name.trim().to_string(),
            email,
            phone: request.phone,
            gender: request.gender,
            city: request.city,
            date_of_birth: request.date_of_birth,
            address: request.address,
            password_hash: hash_password(&request.password)?,
            is_verified: false,
            is_active: false,
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        };

        self.user_repo.create(&user).await?;

        let otp = generate_otp();
        self.user_repo.upsert_otp(&user.id, &otp).await?;

        // The original surfaces a failed OTP mail to the caller on this one
        // path: an account nobody can verify is worse than a failed signup.
        self.mailer
            .send(
                &user.email,
                "Your MediKart verification code",
                &format!(
                    "Hello {},\n\nThank you for registering with MediKart.\n\nYour OTP code is: {}.",
                    user.full_name, otp
                ),
            )
            .await
            .map_err(|e| AppError::validation(format!("Failed to send OTP: {}", e)))?;

        Ok(user.profile())
    }

    pub async fn verify_otp(&self, email: &str, otp_code: &str) -> Result<UserProfile> {
        let user = self
            .user_repo
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(|| AppError::not_found("No account for that email"))?;

        if user.is_verified {
            return Ok(user.profile());
        }

        let otp = self
            .user_repo
            .find_otp(&user.id)
            .await?
            .ok_or_else(|| AppError::validation("No OTP issued for this account"))?;

        if otp.is_expired(self.security.otp_ttl_minutes) {
            return Err(AppError::validation("OTP has expired, request a new one"));
        }

        if otp.otp_code != otp_code {
            return Err(AppError::validation("Incorrect OTP code"));
        }

        self.user_repo.mark_verified(&user.id).await?;
        self.user_repo.delete_otp(&user.id).await?;

        tracing::info!(user_id = %user.id, "Account verified");

        let mut verified = user;
        verified.is_verified = true;
        verified.is_active = true;
        Ok(verified.profile())
    }

    pub async fn resend_otp(&self, email: &str) -> Result<()> {
        let user = self
            .user_repo
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(|| AppError::not_found("No account for that email"))?;

        if user.is_verified {
            return Err(AppError::validation("Account is already verified"));
        }

        let otp = generate_otp();
        self.user_repo.upsert_otp(&user.id, &otp).await?;

        self.mailer
            .send(
                &user.email,
                "Your MediKart verification code",
                &format!(
                    "Hello {},\n\nYour new OTP code is: {}.",
                    user.full_name, otp
                ),
            )
            .await
            .map_err(|e| AppError::validation(format!("Failed to send OTP: {}", e)))?;

        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(UserProfile, TokenPair)> {
        let user = self
            .user_repo
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::unauthorized("Invalid email or password"));
        }

        if !user.is_verified {
            return Err(AppError::forbidden(
                "Please verify your email via OTP before logging in",
            ));
        }

        if !user.is_active {
            return Err(AppError::forbidden("Account is deactivated"));
        }

        let pair = self.issue_token_pair(&user.id).await?;
        Ok((user.profile(), pair))
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let token = self
            .token_repo
            .find_live_by_refresh_hash(&hash_token(refresh_token))
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid or expired refresh token"))?;

        let access_token = generate_token();
        let access_expires_at =
            Utc::now() + Duration::minutes(self.security.access_token_ttl_minutes);

        self.token_repo
            .rotate_access_token(&token.id, &hash_token(&access_token), access_expires_at)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.to_string(),
            access_expires_at,
            refresh_expires_at: token.refresh_expires_at,
        })
    }

    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        let revoked = self
            .token_repo
            .revoke_by_refresh_hash(&hash_token(refresh_token))
            .await?;

        if !revoked {
            // Already revoked or never issued; logout stays idempotent
            tracing::debug!("Logout for unknown or already-revoked refresh token");
        }

        Ok(())
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<UserProfile> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        Ok(user.profile())
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if let Some(full_name) = request.full_name {
            if full_name.trim().is_empty() {
                return Err(AppError::validation("Full name cannot be empty"));
            }
            user.full_name = full_name.trim().to_string();
        }
        if let Some(phone) = request.phone {
            validate_phone(&phone)?;
            user.phone = phone;
        }
        if let Some(gender) = request.gender {
            user.gender = gender;
        }
        if let Some(city) = request.city {
            user.city = city;
        }
        if let Some(date_of_birth) = request.date_of_birth {
            user.date_of_birth = Some(date_of_birth);
        }
        if let Some(address) = request.address {
            user.address = Some(address);
        }

        self.user_repo.update_profile(&user).await?;
        Ok(user.profile())
    }

    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<UserProfile>> {
        let users = self.user_repo.list(limit, offset).await?;
        Ok(users.iter().map(User::profile).collect())
    }

    async fn issue_token_pair(&self, user_id: &str) -> Result<TokenPair> {
        let access_token = generate_token();
        let refresh_token = generate_token();
        let now = Utc::now();
        let access_expires_at = now + Duration::minutes(self.security.access_token_ttl_minutes);
        let refresh_expires_at = now + Duration::days(self.security.refresh_token_ttl_days);

        let token = AuthToken {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            access_token_hash: hash_token(&access_token),
            refresh_token_hash: hash_token(&refresh_token),
            access_expires_at,
            refresh_expires_at,
            revoked: false,
            created_at: now,
        };

        self.token_repo.create(&token).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }
}

/// Argon2 hash for account passwords
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("Invalid hash format: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Random 6-digit verification code
fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    code.to_string()
}

/// 32-byte random bearer token, hex-encoded
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

fn validate_phone(phone: &str) -> Result<()> {
    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation(
            "Phone number must contain only digits.",
        ));
    }
    if phone.len() > 11 {
        return Err(AppError::validation(
            "Phone number must not be more than 11 digits.",
        ));
    }
    Ok(())
}

fn validate_password(password: &str, password2: &str) -> Result<()> {
    if password != password2 {
        return Err(AppError::validation("Password fields didn't match."));
    }
    if password.len() < 8 {
        return Err(AppError::validation(
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_generated_otp_is_six_digits() {
        for _ in 0..32 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_generated_tokens_are_unique_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_phone_validation() {
        assert!(validate_phone("01712345678").is_ok());
        assert!(validate_phone("017-1234567").is_err());
        assert!(validate_phone("017123456789").is_err());
    }

    #[test]
    fn test_password_validation() {
        assert!(validate_password("longenough", "longenough").is_ok());
        assert!(validate_password("longenough", "different").is_err());
        assert!(validate_password("short", "short").is_err());
    }
}
