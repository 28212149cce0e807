use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::users::models::AuthToken;

const TOKEN_COLUMNS: &str = r#"
    id, user_id, access_token_hash, refresh_token_hash,
    access_expires_at, refresh_expires_at, revoked, created_at
"#;

/// Repository for bearer token pairs
pub struct TokenRepository {
    pool: MySqlPool,
}

impl TokenRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, token: &AuthToken) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (
                id, user_id, access_token_hash, refresh_token_hash,
                access_expires_at, refresh_expires_at, revoked, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&token.id)
        .bind(&token.user_id)
        .bind(&token.access_token_hash)
        .bind(&token.refresh_token_hash)
        .bind(token.access_expires_at)
        .bind(token.refresh_expires_at)
        .bind(token.revoked)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    /// Live (unrevoked, unexpired) token row for a refresh token digest
    pub async fn find_live_by_refresh_hash(
        &self,
        refresh_token_hash: &str,
    ) -> Result<Option<AuthToken>> {
        let query = format!(
            r#"
            SELECT {}
            FROM auth_tokens
            WHERE refresh_token_hash = ? AND revoked = FALSE AND refresh_expires_at > NOW()
            "#,
            TOKEN_COLUMNS
        );

        sqlx::query_as::<_, AuthToken>(&query)
            .bind(refresh_token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    /// Rotate the access token on a refresh
    pub async fn rotate_access_token(
        &self,
        token_id: &str,
        access_token_hash: &str,
        access_expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE auth_tokens
            SET access_token_hash = ?, access_expires_at = ?
            WHERE id = ? AND revoked = FALSE
            "#,
        )
        .bind(access_token_hash)
        .bind(access_expires_at)
        .bind(token_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::unauthorized("Token has been revoked"));
        }

        Ok(())
    }

    pub async fn revoke_by_refresh_hash(&self, refresh_token_hash: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE auth_tokens SET revoked = TRUE WHERE refresh_token_hash = ? AND revoked = FALSE",
        )
        .bind(refresh_token_hash)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
