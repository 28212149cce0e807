use chrono::{NaiveDate, Utc};
use sqlx::MySqlPool;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::reports::models::{MonthlyReport, PaidItemRow, ReportTotals, YearlyReport};

const PAID_ITEMS_QUERY: &str = r#"
    SELECT oi.order_id, oi.product_name, oi.quantity, oi.unit_price, oi.actual_price, oi.subtotal
    FROM order_items oi
    JOIN orders o ON o.id = oi.order_id
    WHERE o.payment_status = 'paid'
      AND o.created_at >= ?
      AND o.created_at < ?
"#;

const MONTHLY_COLUMNS: &str = r#"
    id, period, total_income, total_profit, total_orders,
    total_products_sold, top_product, products_details, created_at, updated_at
"#;

const YEARLY_COLUMNS: &str = r#"
    id, year, total_income, total_profit, total_orders,
    total_products_sold, top_product, products_details, created_at, updated_at
"#;

/// Repository for report rollups and the paid-order scans that feed them
pub struct ReportRepository {
    pool: MySqlPool,
}

impl ReportRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Paid order lines created within `[start, end)`
    pub async fn paid_items_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PaidItemRow>> {
        sqlx::query_as::<_, PaidItemRow>(PAID_ITEMS_QUERY)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn upsert_monthly(&self, period: &str, totals: &ReportTotals) -> Result<()> {
        let products_details = serde_json::to_value(&totals.products_details)?;

        sqlx::query(
            r#"
            INSERT INTO monthly_reports (
                id, period, total_income, total_profit, total_orders,
                total_products_sold, top_product, products_details, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                total_income = VALUES(total_income),
                total_profit = VALUES(total_profit),
                total_orders = VALUES(total_orders),
                total_products_sold = VALUES(total_products_sold),
                top_product = VALUES(top_product),
                products_details = VALUES(products_details)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(period)
        .bind(totals.total_income)
        .bind(totals.total_profit)
        .bind(totals.total_orders)
        .bind(totals.total_products_sold)
        .bind(&totals.top_product)
        .bind(&products_details)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn upsert_yearly(&self, year: i32, totals: &ReportTotals) -> Result<()> {
        let products_details = serde_json::to_value(&totals.products_details)?;

        sqlx::query(
            r#"
            INSERT INTO yearly_reports (
                id, year, total_income, total_profit, total_orders,
                total_products_sold, top_product, products_details, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                total_income = VALUES(total_income),
                total_profit = VALUES(total_profit),
                total_orders = VALUES(total_orders),
                total_products_sold = VALUES(total_products_sold),
                top_product = VALUES(top_product),
                products_details = VALUES(products_details)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(year)
        .bind(totals.total_income)
        .bind(totals.total_profit)
        .bind(totals.total_orders)
        .bind(totals.total_products_sold)
        .bind(&totals.top_product)
        .bind(&products_details)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn find_monthly(&self, period: &str) -> Result<Option<MonthlyReport>> {
        let query = format!(
            "SELECT {} FROM monthly_reports WHERE period = ?",
            MONTHLY_COLUMNS
        );

        sqlx::query_as::<_, MonthlyReport>(&query)
            .bind(period)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn find_yearly(&self, year: i32) -> Result<Option<YearlyReport>> {
        let query = format!("SELECT {} FROM yearly_reports WHERE year = ?", YEARLY_COLUMNS);

        sqlx::query_as::<_, YearlyReport>(&query)
            .bind(year)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn list_monthly(&self) -> Result<Vec<MonthlyReport>> {
        let query = format!(
            "SELECT {} FROM monthly_reports ORDER BY period DESC",
            MONTHLY_COLUMNS
        );

        sqlx::query_as::<_, MonthlyReport>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn list_yearly(&self) -> Result<Vec<YearlyReport>> {
        let query = format!(
            "SELECT {} FROM yearly_reports ORDER BY year DESC",
            YEARLY_COLUMNS
        );

        sqlx::query_as::<_, YearlyReport>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
