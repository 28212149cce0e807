use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::product::ImageUpload;

/// Pharmaceutical brand (manufacturer)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBrandRequest {
    pub name: String,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBrandRequest {
    pub name: Option<String>,
    pub image: Option<ImageUpload>,
}
