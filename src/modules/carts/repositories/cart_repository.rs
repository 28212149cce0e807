use chrono::Utc;
use sqlx::{MySql, MySqlPool, Transaction};
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::carts::models::{Cart, CartItem, CartItemView};
use crate::modules::catalog::repositories::product_repository::is_unique_violation;

const CART_COLUMNS: &str = "id, user_id, is_active, created_at, updated_at";

const ITEM_VIEW_QUERY: &str = r#"
    SELECT ci.id, ci.product_id, p.name AS product_name, p.slug AS product_slug,
           ci.quantity, ci.unit_price, ci.prescription_request_id, ci.added_at
    FROM cart_items ci
    JOIN products p ON p.id = ci.product_id
    WHERE ci.cart_id = ?
    ORDER BY ci.added_at DESC
"#;

/// Repository for carts and cart lines
pub struct CartRepository {
    pool: MySqlPool,
}

impl CartRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Return the user's active cart, creating one if absent.
    ///
    /// Safe under concurrent calls: the insert races on the
    /// `uniq_active_cart_per_user` key and the loser re-reads the winner's
    /// row.
    pub async fn get_or_create_active(&self, user_id: &str) -> Result<Cart> {
        if let Some(cart) = self.find_active_by_user(user_id).await? {
            return Ok(cart);
        }

        let now = Utc::now();
        let cart = Cart {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, is_active, active_user_id, created_at, updated_at)
            VALUES (?, ?, TRUE, ?, ?, ?)
            "#,
        )
        .bind(&cart.id)
        .bind(user_id)
        .bind(user_id)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(cart),
            Err(e) if is_unique_violation(&e) => self
                .find_active_by_user(user_id)
                .await?
                .ok_or_else(|| AppError::internal("Active cart vanished after insert race")),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// Transaction-scoped variant used by prescription approval, so the
    /// cart injection commits or rolls back with the status transition
    pub async fn get_or_create_active_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        user_id: &str,
    ) -> Result<Cart> {
        let query = format!(
            "SELECT {} FROM carts WHERE user_id = ? AND is_active = TRUE FOR UPDATE",
            CART_COLUMNS
        );

        if let Some(cart) = sqlx::query_as::<_, Cart>(&query)
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(AppError::Database)?
        {
            return Ok(cart);
        }

        let now = Utc::now();
        let cart = Cart {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, is_active, active_user_id, created_at, updated_at)
            VALUES (?, ?, TRUE, ?, ?, ?)
            "#,
        )
        .bind(&cart.id)
        .bind(user_id)
        .bind(user_id)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(cart)
    }

    /// Merge-or-insert inside an approval transaction
    pub async fn insert_or_increment_item_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        item: &CartItem,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_items (
                id, cart_id, product_id, quantity, unit_price, prescription_request_id, added_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                quantity = quantity + VALUES(quantity),
                prescription_request_id = COALESCE(VALUES(prescription_request_id), prescription_request_id)
            "#,
        )
        .bind(&item.id)
        .bind(&item.cart_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(&item.prescription_request_id)
        .bind(item.added_at)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn find_active_by_user(&self, user_id: &str) -> Result<Option<Cart>> {
        let query = format!(
            "SELECT {} FROM carts WHERE user_id = ? AND is_active = TRUE",
            CART_COLUMNS
        );

        sqlx::query_as::<_, Cart>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    /// Lock the user's active cart row for the duration of a transaction
    pub async fn find_active_for_update(
        &self,
        tx: &mut Transaction<'_, MySql>,
        user_id: &str,
    ) -> Result<Option<Cart>> {
        let query = format!(
            "SELECT {} FROM carts WHERE user_id = ? AND is_active = TRUE FOR UPDATE",
            CART_COLUMNS
        );

        sqlx::query_as::<_, Cart>(&query)
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(AppError::Database)
    }

    pub async fn items_with_products(&self, cart_id: &str) -> Result<Vec<CartItemView>> {
        sqlx::query_as::<_, CartItemView>(ITEM_VIEW_QUERY)
            .bind(cart_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    /// Cart lines read under the cart row lock during order placement
    pub async fn items_for_update(
        &self,
        tx: &mut Transaction<'_, MySql>,
        cart_id: &str,
    ) -> Result<Vec<CartItem>> {
        sqlx::query_as::<_, CartItem>(
            r#"
            SELECT id, cart_id, product_id, quantity, unit_price, prescription_request_id, added_at
            FROM cart_items
            WHERE cart_id = ?
            FOR UPDATE
            "#,
        )
        .bind(cart_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(AppError::Database)
    }

    /// Insert a cart line, or increment the quantity of the existing line
    /// for the same product (the (cart, product) pair is unique)
    pub async fn insert_or_increment_item(&self, item: &CartItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_items (
                id, cart_id, product_id, quantity, unit_price, prescription_request_id, added_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                quantity = quantity + VALUES(quantity),
                prescription_request_id = COALESCE(VALUES(prescription_request_id), prescription_request_id)
            "#,
        )
        .bind(&item.id)
        .bind(&item.cart_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(&item.prescription_request_id)
        .bind(item.added_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    /// A cart line together with its owning cart's user and active flag,
    /// for ownership checks
    pub async fn find_item_with_owner(
        &self,
        item_id: &str,
    ) -> Result<Option<(CartItem, String, bool)>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            id: String,
            cart_id: String,
            product_id: String,
            quantity: u32,
            unit_price: rust_decimal::Decimal,
            prescription_request_id: Option<String>,
            added_at: chrono::DateTime<chrono::Utc>,
            owner_id: String,
            cart_active: bool,
        }

        let row = sqlx::query_as::<_, Row>(
            r#"
            SELECT ci.id, ci.cart_id, ci.product_id, ci.quantity, ci.unit_price,
                   ci.prescription_request_id, ci.added_at,
                   c.user_id AS owner_id, c.is_active AS cart_active
            FROM cart_items ci
            JOIN carts c ON c.id = ci.cart_id
            WHERE ci.id = ?
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(|r| {
            (
                CartItem {
                    id: r.id,
                    cart_id: r.cart_id,
                    product_id: r.product_id,
                    quantity: r.quantity,
                    unit_price: r.unit_price,
                    prescription_request_id: r.prescription_request_id,
                    added_at: r.added_at,
                },
                r.owner_id,
                r.cart_active,
            )
        }))
    }

    /// Caller has already verified the line exists and belongs to the user
    pub async fn update_item_quantity(&self, item_id: &str, quantity: u32) -> Result<()> {
        sqlx::query("UPDATE cart_items SET quantity = ? WHERE id = ?")
            .bind(quantity)
            .bind(item_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn delete_item(&self, item_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE id = ?")
            .bind(item_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Deactivate a cart after its order is placed; clearing
    /// `active_user_id` frees the unique slot for the user's next cart
    pub async fn deactivate(&self, tx: &mut Transaction<'_, MySql>, cart_id: &str) -> Result<()> {
        sqlx::query(
            "UPDATE carts SET is_active = FALSE, active_user_id = NULL WHERE id = ?",
        )
        .bind(cart_id)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }
}
