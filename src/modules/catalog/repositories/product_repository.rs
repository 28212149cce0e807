use sqlx::{MySql, MySqlPool, Transaction};

use crate::core::{AppError, Result};
use crate::modules::catalog::models::Product;

const PRODUCT_COLUMNS: &str = r#"
    id, sku, name, slug, description,
    generic_name, indication, adult_dose, child_dose,
    contraindication, precaution, side_effect,
    category_id, brand_id,
    price, actual_price, offer_percentage, new_price, discount_price,
    stock, unit, unit_value, weight_value, weight_unit,
    weight_display, unit_display, package_quantity,
    prescription_required, image1_url, image2_url, image3_url,
    is_active, created_at, updated_at
"#;

/// Repository for product rows
pub struct ProductRepository {
    pool: MySqlPool,
}

impl ProductRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub async fn create(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, slug, description,
                generic_name, indication, adult_dose, child_dose,
                contraindication, precaution, side_effect,
                category_id, brand_id,
                price, actual_price, offer_percentage, new_price, discount_price,
                stock, unit, unit_value, weight_value, weight_unit,
                weight_display, unit_display, package_quantity,
                prescription_required, image1_url, image2_url, image3_url,
                is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(&product.generic_name)
        .bind(&product.indication)
        .bind(&product.adult_dose)
        .bind(&product.child_dose)
        .bind(&product.contraindication)
        .bind(&product.precaution)
        .bind(&product.side_effect)
        .bind(&product.category_id)
        .bind(&product.brand_id)
        .bind(product.price)
        .bind(product.actual_price)
        .bind(product.offer_percentage)
        .bind(product.new_price)
        .bind(product.discount_price)
        .bind(product.stock)
        .bind(product.unit)
        .bind(&product.unit_value)
        .bind(product.weight_value)
        .bind(product.weight_unit)
        .bind(&product.weight_display)
        .bind(&product.unit_display)
        .bind(product.package_quantity)
        .bind(product.prescription_required)
        .bind(&product.image1_url)
        .bind(&product.image2_url)
        .bind(&product.image3_url)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::validation(format!("Product with sku '{}' already exists", product.sku))
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(())
    }

    pub async fn update(&self, product: &Product) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?, slug = ?, description = ?,
                generic_name = ?, indication = ?, adult_dose = ?, child_dose = ?,
                contraindication = ?, precaution = ?, side_effect = ?,
                category_id = ?, brand_id = ?,
                price = ?, actual_price = ?, offer_percentage = ?, new_price = ?, discount_price = ?,
                stock = ?, unit = ?, unit_value = ?, weight_value = ?, weight_unit = ?,
                weight_display = ?, unit_display = ?, package_quantity = ?,
                prescription_required = ?, image1_url = ?, image2_url = ?, image3_url = ?,
                is_active = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(&product.generic_name)
        .bind(&product.indication)
        .bind(&product.adult_dose)
        .bind(&product.child_dose)
        .bind(&product.contraindication)
        .bind(&product.precaution)
        .bind(&product.side_effect)
        .bind(&product.category_id)
        .bind(&product.brand_id)
        .bind(product.price)
        .bind(product.actual_price)
        .bind(product.offer_percentage)
        .bind(product.new_price)
        .bind(product.discount_price)
        .bind(product.stock)
        .bind(product.unit)
        .bind(&product.unit_value)
        .bind(product.weight_value)
        .bind(product.weight_unit)
        .bind(&product.weight_display)
        .bind(&product.unit_display)
        .bind(product.package_quantity)
        .bind(product.prescription_required)
        .bind(&product.image1_url)
        .bind(&product.image2_url)
        .bind(&product.image3_url)
        .bind(product.is_active)
        .bind(&product.id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Product with id '{}' not found",
                product.id
            )));
        }

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Product>> {
        let query = format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS);

        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let query = format!("SELECT {} FROM products WHERE slug = ?", PRODUCT_COLUMNS);

        sqlx::query_as::<_, Product>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    /// List products, newest first; non-admin callers only see active rows
    pub async fn list(
        &self,
        include_inactive: bool,
        category_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>> {
        let limit = limit.clamp(1, 100);

        let mut query = format!(
            "SELECT {} FROM products WHERE (? OR is_active = TRUE)",
            PRODUCT_COLUMNS
        );
        if category_id.is_some() {
            query.push_str(" AND category_id = ?");
        }
        query.push_str(" ORDER BY name ASC LIMIT ? OFFSET ?");

        let mut q = sqlx::query_as::<_, Product>(&query).bind(include_inactive);
        if let Some(category_id) = category_id {
            q = q.bind(category_id);
        }

        q.bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM products WHERE slug = ?")
                .bind(slug)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::Database)?;

        Ok(count.0 > 0)
    }

    pub async fn sku_exists(&self, sku: &str) -> Result<bool> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE sku = ?")
            .bind(sku)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(count.0 > 0)
    }

    /// Conditional stock decrement inside an order transaction.
    ///
    /// A single read-modify-write statement; returns false (without touching
    /// the row) when the remaining stock is insufficient, so concurrent
    /// orders cannot oversell.
    pub async fn try_decrement_stock(
        &self,
        tx: &mut Transaction<'_, MySql>,
        product_id: &str,
        quantity: u32,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?
            WHERE id = ? AND stock >= ?
            "#,
        )
        .bind(quantity)
        .bind(product_id)
        .bind(quantity)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    /// Snapshot fields copied onto order lines, read inside the placement
    /// transaction
    pub async fn order_snapshot(
        &self,
        tx: &mut Transaction<'_, MySql>,
        product_id: &str,
    ) -> Result<Option<(String, rust_decimal::Decimal)>> {
        let row: Option<(String, rust_decimal::Decimal)> =
            sqlx::query_as("SELECT name, actual_price FROM products WHERE id = ?")
                .bind(product_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(AppError::Database)?;

        Ok(row)
    }

    /// Current stock for a product, read inside a transaction for error
    /// reporting after a failed conditional decrement
    pub async fn stock_for_update(
        &self,
        tx: &mut Transaction<'_, MySql>,
        product_id: &str,
    ) -> Result<u32> {
        let row: (u32,) = sqlx::query_as("SELECT stock FROM products WHERE id = ? FOR UPDATE")
            .bind(product_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(AppError::Database)?;

        Ok(row.0)
    }
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}
