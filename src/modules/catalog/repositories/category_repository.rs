use sqlx::MySqlPool;

use super::product_repository::is_unique_violation;
use crate::core::{AppError, Result};
use crate::modules::catalog::models::Category;

/// Repository for category rows
pub struct CategoryRepository {
    pool: MySqlPool,
}

impl CategoryRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, category: &Category) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, parent_id, image_url, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.parent_id)
        .bind(&category.image_url)
        .bind(category.is_active)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::validation(format!(
                    "Category '{}' already exists",
                    category.name
                ))
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(())
    }

    pub async fn update(&self, category: &Category) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE categories
            SET name = ?, slug = ?, parent_id = ?, image_url = ?, is_active = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.parent_id)
        .bind(&category.image_url)
        .bind(category.is_active)
        .bind(&category.id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Category with id '{}' not found",
                category.id
            )));
        }

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, slug, parent_id, image_url, is_active, created_at, updated_at
            FROM categories WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Category>> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, slug, parent_id, image_url, is_active, created_at, updated_at
            FROM categories
            WHERE (? OR is_active = TRUE)
            ORDER BY name
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(count.0 > 0)
    }
}
