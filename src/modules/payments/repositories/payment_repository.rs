use sqlx::{MySql, MySqlPool, Transaction};

use crate::core::{AppError, Result};
use crate::modules::payments::models::{Payment, PaymentStatus};

const PAYMENT_COLUMNS: &str = r#"
    id, order_id, gateway_id, tran_id, amount, status,
    session_key, raw_payload, created_at, updated_at
"#;

/// Repository for payment rows
pub struct PaymentRepository {
    pool: MySqlPool,
}

impl PaymentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Insert the pending payment inside the order-placement transaction
    pub async fn create_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        payment: &Payment,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_id, gateway_id, tran_id, amount, status,
                session_key, raw_payload, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.order_id)
        .bind(&payment.gateway_id)
        .bind(&payment.tran_id)
        .bind(payment.amount)
        .bind(payment.status)
        .bind(&payment.session_key)
        .bind(&payment.raw_payload)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>> {
        let query = format!("SELECT {} FROM payments WHERE order_id = ?", PAYMENT_COLUMNS);

        sqlx::query_as::<_, Payment>(&query)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    /// Lock the payment row while a callback is reconciled; replayed
    /// callbacks serialize here
    pub async fn find_by_tran_id_for_update(
        &self,
        tx: &mut Transaction<'_, MySql>,
        tran_id: &str,
    ) -> Result<Option<Payment>> {
        let query = format!(
            "SELECT {} FROM payments WHERE tran_id = ? FOR UPDATE",
            PAYMENT_COLUMNS
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(tran_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(AppError::Database)
    }

    /// Record the terminal status and the verbatim gateway payload
    pub async fn resolve_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        payment_id: &str,
        status: PaymentStatus,
        raw_payload: &serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE payments SET status = ?, raw_payload = ?, updated_at = NOW() WHERE id = ?",
        )
        .bind(status)
        .bind(raw_payload)
        .bind(payment_id)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    /// Mark a cash-on-delivery payment paid within the placement transaction
    pub async fn mark_paid_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        payment_id: &str,
    ) -> Result<()> {
        sqlx::query("UPDATE payments SET status = 'paid', updated_at = NOW() WHERE id = ?")
            .bind(payment_id)
            .execute(&mut **tx)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Store the gateway session reference after the session call succeeds
    pub async fn set_session_key(&self, payment_id: &str, session_key: &str) -> Result<()> {
        sqlx::query("UPDATE payments SET session_key = ? WHERE id = ?")
            .bind(session_key)
            .bind(payment_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }
}
