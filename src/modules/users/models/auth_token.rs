use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Stored token pair; only SHA-256 digests are persisted
#[derive(Debug, Clone, FromRow)]
pub struct AuthToken {
    pub id: String,
    pub user_id: String,
    pub access_token_hash: String,
    pub refresh_token_hash: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

/// Plaintext token pair returned to the client exactly once
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}
