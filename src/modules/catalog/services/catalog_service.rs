use chrono::Utc;
use uuid::Uuid;

use super::pricing::{derive_prices, validate_image_size, validate_price_inputs};
use super::slug::{slug_with_suffix, slugify};
use crate::core::{AppError, Result};
use crate::modules::catalog::models::{
    package_quantity_for, unit_display, weight_display, Brand, Category, CreateBrandRequest,
    CreateCategoryRequest, CreateProductRequest, ImageUpload, Product, UpdateBrandRequest,
    UpdateCategoryRequest, UpdateProductRequest,
};
use crate::modules::catalog::repositories::{
    BrandRepository, CategoryRepository, ProductRepository,
};

/// Catalog service: brands, categories, products.
///
/// Derived fields (slug, selling price, display strings) are recomputed
/// through the pure helpers on every save, never inside a storage hook.
pub struct CatalogService {
    product_repo: ProductRepository,
    brand_repo: BrandRepository,
    category_repo: CategoryRepository,
}

impl CatalogService {
    pub fn new(
        product_repo: ProductRepository,
        brand_repo: BrandRepository,
        category_repo: CategoryRepository,
    ) -> Self {
        Self {
            product_repo,
            brand_repo,
            category_repo,
        }
    }

    // ----- Brands -----

    pub async fn create_brand(&self, request: CreateBrandRequest) -> Result<Brand> {
        let name = non_empty(&request.name, "Brand name")?;
        let image_url = checked_image_url(request.image)?;

        let mut slug = slugify(&name);
        while self.brand_repo.slug_exists(&slug).await? {
            slug = slug_with_suffix(&slugify(&name));
        }

        let now = Utc::now();
        let brand = Brand {
            id: Uuid::new_v4().to_string(),
            name,
            slug,
            image_url,
            created_at: now,
            updated_at: now,
        };

        self.brand_repo.create(&brand).await?;
        Ok(brand)
    }

    pub async fn update_brand(&self, id: &str, request: UpdateBrandRequest) -> Result<Brand> {
        let mut brand = self
            .brand_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Brand with id '{}' not found", id)))?;

        if let Some(name) = request.name {
            brand.name = non_empty(&name, "Brand name")?;
        }
        if let Some(image) = request.image {
            validate_image_size(image.size_bytes)?;
            brand.image_url = Some(image.url);
        }

        self.brand_repo.update(&brand).await?;
        Ok(brand)
    }

    pub async fn list_brands(&self) -> Result<Vec<Brand>> {
        self.brand_repo.list().await
    }

    // ----- Categories -----

    pub async fn create_category(&self, request: CreateCategoryRequest) -> Result<Category> {
        let name = non_empty(&request.name, "Category name")?;
        let image_url = checked_image_url(request.image)?;

        if let Some(parent_id) = &request.parent_id {
            if self.category_repo.find_by_id(parent_id).await?.is_none() {
                return Err(AppError::validation(format!(
                    "Parent category '{}' does not exist",
                    parent_id
                )));
            }
        }

        let mut slug = slugify(&name);
        while self.category_repo.slug_exists(&slug).await? {
            slug = slug_with_suffix(&slugify(&name));
        }

        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name,
            slug,
            parent_id: request.parent_id,
            image_url,
            is_active: request.is_active,
            created_at: now,
            updated_at: now,
        };

        self.category_repo.create(&category).await?;
        Ok(category)
    }

    pub async fn update_category(
        &self,
        id: &str,
        request: UpdateCategoryRequest,
    ) -> Result<Category> {
        let mut category = self
            .category_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Category with id '{}' not found", id)))?;

        if let Some(name) = request.name {
            category.name = non_empty(&name, "Category name")?;
        }
        if let Some(parent_id) = request.parent_id {
            if parent_id == category.id {
                return Err(AppError::validation("Category cannot be its own parent"));
            }
            category.parent_id = Some(parent_id);
        }
        if let Some(image) = request.image {
            validate_image_size(image.size_bytes)?;
            category.image_url = Some(image.url);
        }
        if let Some(is_active) = request.is_active {
            category.is_active = is_active;
        }

        self.category_repo.update(&category).await?;
        Ok(category)
    }

    pub async fn list_categories(&self, include_inactive: bool) -> Result<Vec<Category>> {
        self.category_repo.list(include_inactive).await
    }

    // ----- Products -----

    pub async fn create_product(&self, request: CreateProductRequest) -> Result<Product> {
        let name = non_empty(&request.name, "Product name")?;
        let sku = non_empty(&request.sku, "SKU")?;

        if self.product_repo.sku_exists(&sku).await? {
            return Err(AppError::validation(format!(
                "Product with sku '{}' already exists",
                sku
            )));
        }

        if self.category_repo.find_by_id(&request.category_id).await?.is_none() {
            return Err(AppError::validation(format!(
                "Category '{}' does not exist",
                request.category_id
            )));
        }
        if let Some(brand_id) = &request.brand_id {
            if self.brand_repo.find_by_id(brand_id).await?.is_none() {
                return Err(AppError::validation(format!(
                    "Brand '{}' does not exist",
                    brand_id
                )));
            }
        }

        validate_price_inputs(request.price, request.offer_percentage)?;
        let prices = derive_prices(request.price, request.offer_percentage);

        let image1_url = checked_image_url(request.image1)?;
        let image2_url = checked_image_url(request.image2)?;
        let image3_url = checked_image_url(request.image3)?;

        let mut slug = slugify(&name);
        while self.product_repo.slug_exists(&slug).await? {
            slug = slug_with_suffix(&slugify(&name));
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku,
            slug,
            description: request.description,
            generic_name: request.generic_name,
            indication: request.indication,
            adult_dose: request.adult_dose,
            child_dose: request.child_dose,
            contraindication: request.contraindication,
            precaution: request.precaution,
            side_effect: request.side_effect,
            category_id: request.category_id,
            brand_id: request.brand_id,
            price: request.price,
            actual_price: request.actual_price,
            offer_percentage: request.offer_percentage,
            new_price: prices.new_price,
            discount_price: prices.discount_price,
            stock: request.stock,
            unit: request.unit,
            weight_display: weight_display(request.weight_value, request.weight_unit),
            unit_display: Some(unit_display(request.unit_value.as_deref(), request.unit)),
            package_quantity: package_quantity_for(request.unit),
            unit_value: request.unit_value,
            weight_value: request.weight_value,
            weight_unit: request.weight_unit,
            prescription_required: request.prescription_required,
            image1_url,
            image2_url,
            image3_url,
            is_active: request.is_active,
            created_at: now,
            updated_at: now,
            name,
        };

        self.product_repo.create(&product).await?;
        Ok(product)
    }

    pub async fn update_product(&self, id: &str, request: UpdateProductRequest) -> Result<Product> {
        let mut product = self
            .product_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product with id '{}' not found", id)))?;

        if let Some(name) = request.name {
            product.name = non_empty(&name, "Product name")?;
        }
        if let Some(description) = request.description {
            product.description = Some(description);
        }
        if let Some(generic_name) = request.generic_name {
            product.generic_name = Some(generic_name);
        }
        if let Some(indication) = request.indication {
            product.indication = Some(indication);
        }
        if let Some(adult_dose) = request.adult_dose {
            product.adult_dose = Some(adult_dose);
        }
        if let Some(child_dose) = request.child_dose {
            product.child_dose = Some(child_dose);
        }
        if let Some(contraindication) = request.contraindication {
            product.contraindication = Some(contraindication);
        }
        if let Some(precaution) = request.precaution {
            product.precaution = Some(precaution);
        }
        if let Some(side_effect) = request.side_effect {
            product.side_effect = Some(side_effect);
        }
        if let Some(category_id) = request.category_id {
            if self.category_repo.find_by_id(&category_id).await?.is_none() {
                return Err(AppError::validation(format!(
                    "Category '{}' does not exist",
                    category_id
                )));
            }
            product.category_id = category_id;
        }
        if let Some(brand_id) = request.brand_id {
            if self.brand_repo.find_by_id(&brand_id).await?.is_none() {
                return Err(AppError::validation(format!(
                    "Brand '{}' does not exist",
                    brand_id
                )));
            }
            product.brand_id = Some(brand_id);
        }
        if let Some(price) = request.price {
            product.price = price;
        }
        if let Some(actual_price) = request.actual_price {
            product.actual_price = actual_price;
        }
        if let Some(offer_percentage) = request.offer_percentage {
            product.offer_percentage = offer_percentage;
        }
        if let Some(stock) = request.stock {
            product.stock = stock;
        }
        if let Some(unit) = request.unit {
            product.unit = unit;
        }
        if let Some(unit_value) = request.unit_value {
            product.unit_value = Some(unit_value);
        }
        if let Some(weight_value) = request.weight_value {
            product.weight_value = Some(weight_value);
        }
        if let Some(weight_unit) = request.weight_unit {
            product.weight_unit = Some(weight_unit);
        }
        if let Some(prescription_required) = request.prescription_required {
            product.prescription_required = prescription_required;
        }
        if let Some(image) = request.image1 {
            validate_image_size(image.size_bytes)?;
            product.image1_url = Some(image.url);
        }
        if let Some(image) = request.image2 {
            validate_image_size(image.size_bytes)?;
            product.image2_url = Some(image.url);
        }
        if let Some(image) = request.image3 {
            validate_image_size(image.size_bytes)?;
            product.image3_url = Some(image.url);
        }
        if let Some(is_active) = request.is_active {
            product.is_active = is_active;
        }

        // Derived fields are recomputed on every save, not only on create
        validate_price_inputs(product.price, product.offer_percentage)?;
        let prices = derive_prices(product.price, product.offer_percentage);
        product.new_price = prices.new_price;
        product.discount_price = prices.discount_price;
        product.weight_display = weight_display(product.weight_value, product.weight_unit);
        product.unit_display = Some(unit_display(product.unit_value.as_deref(), product.unit));
        product.package_quantity = package_quantity_for(product.unit);

        self.product_repo.update(&product).await?;
        Ok(product)
    }

    pub async fn get_product(&self, id: &str) -> Result<Product> {
        self.product_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product with id '{}' not found", id)))
    }

    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Product> {
        self.product_repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Product '{}' not found", slug)))
    }

    pub async fn list_products(
        &self,
        include_inactive: bool,
        category_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>> {
        self.product_repo
            .list(include_inactive, category_id, limit, offset)
            .await
    }
}

fn non_empty(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} cannot be empty", field)));
    }
    Ok(trimmed.to_string())
}

fn checked_image_url(image: Option<ImageUpload>) -> Result<Option<String>> {
    match image {
        Some(image) => {
            validate_image_size(image.size_bytes)?;
            Ok(Some(image.url))
        }
        None => Ok(None),
    }
}
