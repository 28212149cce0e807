use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlPool, Transaction};

use crate::core::{AppError, Result};
use crate::modules::prescriptions::models::{
    PrescriptionItem, PrescriptionItemView, PrescriptionRequest, PrescriptionStatus,
};

const REQUEST_COLUMNS: &str = r#"
    id, user_id, status, upload_url, notes, admin_notes,
    reviewed_by, reviewed_at, auto_add_to_cart, created_at, updated_at
"#;

/// Product fields needed when an approved item is injected into a cart
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductPriceRow {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub new_price: Decimal,
    pub is_active: bool,
}

impl ProductPriceRow {
    /// Discounted price when present and lower, else the base price
    pub fn effective_price(&self) -> Decimal {
        if self.new_price > Decimal::ZERO && self.new_price < self.price {
            self.new_price
        } else {
            self.price
        }
    }
}

/// Repository for prescription requests and their items
pub struct PrescriptionRepository {
    pool: MySqlPool,
}

impl PrescriptionRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Create a request with its items in one transaction
    pub async fn create(
        &self,
        request: &PrescriptionRequest,
        items: &[PrescriptionItem],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query(
            r#"
            INSERT INTO prescription_requests (
                id, user_id, status, upload_url, notes, admin_notes,
                reviewed_by, reviewed_at, auto_add_to_cart, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.id)
        .bind(&request.user_id)
        .bind(request.status)
        .bind(&request.upload_url)
        .bind(&request.notes)
        .bind(&request.admin_notes)
        .bind(&request.reviewed_by)
        .bind(request.reviewed_at)
        .bind(request.auto_add_to_cart)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO prescription_items (
                    id, prescription_request_id, product_id, quantity, note
                ) VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.id)
            .bind(&item.prescription_request_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(&item.note)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<PrescriptionRequest>> {
        let query = format!(
            "SELECT {} FROM prescription_requests WHERE id = ?",
            REQUEST_COLUMNS
        );

        sqlx::query_as::<_, PrescriptionRequest>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    /// Lock the request row so concurrent reviewer actions serialize
    pub async fn find_by_id_for_update(
        &self,
        tx: &mut Transaction<'_, MySql>,
        id: &str,
    ) -> Result<Option<PrescriptionRequest>> {
        let query = format!(
            "SELECT {} FROM prescription_requests WHERE id = ? FOR UPDATE",
            REQUEST_COLUMNS
        );

        sqlx::query_as::<_, PrescriptionRequest>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(AppError::Database)
    }

    pub async fn items_with_products(&self, request_id: &str) -> Result<Vec<PrescriptionItemView>> {
        sqlx::query_as::<_, PrescriptionItemView>(
            r#"
            SELECT pi.id, pi.product_id, p.name AS product_name, p.sku AS product_sku,
                   pi.quantity, pi.note
            FROM prescription_items pi
            JOIN products p ON p.id = pi.product_id
            WHERE pi.prescription_request_id = ?
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    /// Items read inside the approval transaction
    pub async fn items_for_update(
        &self,
        tx: &mut Transaction<'_, MySql>,
        request_id: &str,
    ) -> Result<Vec<PrescriptionItem>> {
        sqlx::query_as::<_, PrescriptionItem>(
            r#"
            SELECT id, prescription_request_id, product_id, quantity, note
            FROM prescription_items
            WHERE prescription_request_id = ?
            FOR UPDATE
            "#,
        )
        .bind(request_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(AppError::Database)
    }

    /// Pricing fields of a product, read inside the approval transaction so
    /// injected cart lines snapshot the price that was current at approval
    pub async fn product_pricing(
        &self,
        tx: &mut Transaction<'_, MySql>,
        product_id: &str,
    ) -> Result<Option<ProductPriceRow>> {
        sqlx::query_as::<_, ProductPriceRow>(
            "SELECT id, name, sku, price, new_price, is_active FROM products WHERE id = ?",
        )
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)
    }

    /// Record the terminal transition; caller holds the row lock
    pub async fn record_review(
        &self,
        tx: &mut Transaction<'_, MySql>,
        id: &str,
        status: PrescriptionStatus,
        reviewed_by: &str,
        reviewed_at: DateTime<Utc>,
        admin_notes: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE prescription_requests
            SET status = ?, reviewed_by = ?, reviewed_at = ?,
                admin_notes = COALESCE(?, admin_notes)
            WHERE id = ?
            "#,
        )
        .bind(status)
        .bind(reviewed_by)
        .bind(reviewed_at)
        .bind(admin_notes)
        .bind(id)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<PrescriptionRequest>> {
        let query = format!(
            "SELECT {} FROM prescription_requests WHERE user_id = ? ORDER BY created_at DESC",
            REQUEST_COLUMNS
        );

        sqlx::query_as::<_, PrescriptionRequest>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn list_all(
        &self,
        status: Option<PrescriptionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PrescriptionRequest>> {
        let mut query = format!("SELECT {} FROM prescription_requests", REQUEST_COLUMNS);
        if status.is_some() {
            query.push_str(" WHERE status = ?");
        }
        query.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

        let mut q = sqlx::query_as::<_, PrescriptionRequest>(&query);
        if let Some(status) = status {
            q = q.bind(status);
        }

        q.bind(limit.clamp(1, 100))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
