use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::catalog::repositories::product_repository::is_unique_violation;
use crate::modules::users::models::{EmailOtp, User};

const USER_COLUMNS: &str = r#"
    id, full_name, email, phone, gender, city, date_of_birth, address,
    password_hash, is_verified, is_active, role, created_at, updated_at
"#;

/// Repository for user accounts and their OTP codes
pub struct UserRepository {
    pool: MySqlPool,
}

impl UserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, full_name, email, phone, gender, city, date_of_birth, address,
                password_hash, is_verified, is_active, role, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.gender)
        .bind(&user.city)
        .bind(user.date_of_birth)
        .bind(&user.address)
        .bind(&user.password_hash)
        .bind(user.is_verified)
        .bind(user.is_active)
        .bind(user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::validation(format!("Account with email '{}' already exists", user.email))
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    /// Flip the account to verified and active after OTP confirmation
    pub async fn mark_verified(&self, user_id: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE users SET is_verified = TRUE, is_active = TRUE WHERE id = ?")
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "User with id '{}' not found",
                user_id
            )));
        }

        Ok(())
    }

    pub async fn update_profile(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET full_name = ?, phone = ?, gender = ?, city = ?, date_of_birth = ?, address = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(&user.gender)
        .bind(&user.city)
        .bind(user.date_of_birth)
        .bind(&user.address)
        .bind(&user.id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let query = format!(
            "SELECT {} FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(limit.clamp(1, 100))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    // ----- OTP codes -----

    /// Insert or replace the user's live OTP
    pub async fn upsert_otp(&self, user_id: &str, otp_code: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO email_otps (user_id, otp_code, created_at)
            VALUES (?, ?, NOW())
            ON DUPLICATE KEY UPDATE otp_code = VALUES(otp_code), created_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(otp_code)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn find_otp(&self, user_id: &str) -> Result<Option<EmailOtp>> {
        sqlx::query_as::<_, EmailOtp>(
            "SELECT user_id, otp_code, created_at FROM email_otps WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn delete_otp(&self, user_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM email_otps WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }
}
