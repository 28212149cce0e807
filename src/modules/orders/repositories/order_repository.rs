use sqlx::{MySql, MySqlPool, Transaction};

use crate::core::{AppError, Result};
use crate::modules::orders::models::{Order, OrderItem, OrderStatus};
use crate::modules::payments::models::PaymentStatus;

const ORDER_COLUMNS: &str = r#"
    id, order_number, user_id, shipping_name, shipping_phone,
    shipping_address, shipping_city, payment_method, tran_id,
    total_amount, payment_status, status, created_at, updated_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, order_id, product_id, product_name, unit_price, actual_price, quantity, subtotal
"#;

/// Repository for order snapshots
pub struct OrderRepository {
    pool: MySqlPool,
}

impl OrderRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Insert the order and its snapshot lines inside the placement
    /// transaction
    pub async fn create_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        order: &Order,
        items: &[OrderItem],
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, user_id, shipping_name, shipping_phone,
                shipping_address, shipping_city, payment_method, tran_id,
                total_amount, payment_status, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.user_id)
        .bind(&order.shipping_name)
        .bind(&order.shipping_phone)
        .bind(&order.shipping_address)
        .bind(&order.shipping_city)
        .bind(order.payment_method)
        .bind(&order.tran_id)
        .bind(order.total_amount)
        .bind(order.payment_status)
        .bind(order.status)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, product_name, unit_price,
                    actual_price, quantity, subtotal
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.unit_price)
            .bind(item.actual_price)
            .bind(item.quantity)
            .bind(item.subtotal)
            .execute(&mut **tx)
            .await
            .map_err(AppError::Database)?;
        }

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Order>> {
        let query = format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS);

        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn items_for_order(&self, order_id: &str) -> Result<Vec<OrderItem>> {
        let query = format!(
            "SELECT {} FROM order_items WHERE order_id = ? ORDER BY product_name",
            ITEM_COLUMNS
        );

        sqlx::query_as::<_, OrderItem>(&query)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn list_for_user(&self, user_id: &str, limit: i64, offset: i64) -> Result<Vec<Order>> {
        let query = format!(
            "SELECT {} FROM orders WHERE user_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
            ORDER_COLUMNS
        );

        sqlx::query_as::<_, Order>(&query)
            .bind(user_id)
            .bind(limit.clamp(1, 100))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<Order>> {
        let query = format!(
            "SELECT {} FROM orders ORDER BY created_at DESC LIMIT ? OFFSET ?",
            ORDER_COLUMNS
        );

        sqlx::query_as::<_, Order>(&query)
            .bind(limit.clamp(1, 100))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    /// Resolve payment and fulfillment status together when a callback or
    /// COD confirmation lands
    pub async fn update_statuses_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        order_id: &str,
        payment_status: PaymentStatus,
        status: OrderStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE orders SET payment_status = ?, status = ?, updated_at = NOW() WHERE id = ?")
            .bind(payment_status)
            .bind(status)
            .bind(order_id)
            .execute(&mut **tx)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Admin fulfillment progression
    pub async fn update_fulfillment_status(&self, order_id: &str, status: OrderStatus) -> Result<()> {
        let result = sqlx::query("UPDATE orders SET status = ?, updated_at = NOW() WHERE id = ?")
            .bind(status)
            .bind(order_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Order with id '{}' not found",
                order_id
            )));
        }

        Ok(())
    }
}
