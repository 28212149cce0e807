use sqlx::MySqlPool;

use super::product_repository::is_unique_violation;
use crate::core::{AppError, Result};
use crate::modules::catalog::models::Brand;

/// Repository for brand rows
pub struct BrandRepository {
    pool: MySqlPool,
}

impl BrandRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, brand: &Brand) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO brands (id, name, slug, image_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&brand.id)
        .bind(&brand.name)
        .bind(&brand.slug)
        .bind(&brand.image_url)
        .bind(brand.created_at)
        .bind(brand.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::validation(format!("Brand slug '{}' already exists", brand.slug))
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(())
    }

    pub async fn update(&self, brand: &Brand) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE brands SET name = ?, slug = ?, image_url = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(&brand.name)
        .bind(&brand.slug)
        .bind(&brand.image_url)
        .bind(&brand.id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Brand with id '{}' not found",
                brand.id
            )));
        }

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Brand>> {
        sqlx::query_as::<_, Brand>(
            "SELECT id, name, slug, image_url, created_at, updated_at FROM brands WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list(&self) -> Result<Vec<Brand>> {
        sqlx::query_as::<_, Brand>(
            "SELECT id, name, slug, image_url, created_at, updated_at FROM brands ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM brands WHERE slug = ?")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(count.0 > 0)
    }
}
