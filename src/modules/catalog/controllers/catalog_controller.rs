use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::error::AppError;
use crate::middleware::auth::{AdminUser, CurrentUser};
use crate::modules::catalog::models::{
    CreateBrandRequest, CreateCategoryRequest, CreateProductRequest, UpdateBrandRequest,
    UpdateCategoryRequest, UpdateProductRequest,
};
use crate::modules::catalog::services::CatalogService;

/// Query parameters for listing products
#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub category_id: Option<String>,
}

fn default_limit() -> i64 {
    50
}

/// POST /brands (admin)
pub async fn create_brand(
    service: web::Data<Arc<CatalogService>>,
    _admin: AdminUser,
    request: web::Json<CreateBrandRequest>,
) -> Result<HttpResponse, AppError> {
    let brand = service.create_brand(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(brand))
}

/// PATCH /brands/{id} (admin)
pub async fn update_brand(
    service: web::Data<Arc<CatalogService>>,
    _admin: AdminUser,
    path: web::Path<String>,
    request: web::Json<UpdateBrandRequest>,
) -> Result<HttpResponse, AppError> {
    let brand = service
        .update_brand(&path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(brand))
}

/// GET /brands
pub async fn list_brands(
    service: web::Data<Arc<CatalogService>>,
) -> Result<HttpResponse, AppError> {
    let brands = service.list_brands().await?;
    Ok(HttpResponse::Ok().json(brands))
}

/// POST /categories (admin)
pub async fn create_category(
    service: web::Data<Arc<CatalogService>>,
    _admin: AdminUser,
    request: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    let category = service.create_category(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(category))
}

/// PATCH /categories/{id} (admin)
pub async fn update_category(
    service: web::Data<Arc<CatalogService>>,
    _admin: AdminUser,
    path: web::Path<String>,
    request: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    let category = service
        .update_category(&path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(category))
}

/// GET /categories — public; admins also see inactive rows
pub async fn list_categories(
    service: web::Data<Arc<CatalogService>>,
    user: Option<CurrentUser>,
) -> Result<HttpResponse, AppError> {
    let include_inactive = user.map(|u| u.is_admin()).unwrap_or(false);
    let categories = service.list_categories(include_inactive).await?;
    Ok(HttpResponse::Ok().json(categories))
}

/// POST /products (admin)
pub async fn create_product(
    service: web::Data<Arc<CatalogService>>,
    _admin: AdminUser,
    request: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let product = service.create_product(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(product))
}

/// PATCH /products/{id} (admin)
pub async fn update_product(
    service: web::Data<Arc<CatalogService>>,
    _admin: AdminUser,
    path: web::Path<String>,
    request: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let product = service
        .update_product(&path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(product))
}

/// GET /products — public; admins also see inactive rows
pub async fn list_products(
    service: web::Data<Arc<CatalogService>>,
    user: Option<CurrentUser>,
    query: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
    let include_inactive = user.map(|u| u.is_admin()).unwrap_or(false);
    let products = service
        .list_products(
            include_inactive,
            query.category_id.as_deref(),
            query.limit,
            query.offset,
        )
        .await?;
    Ok(HttpResponse::Ok().json(products))
}

/// GET /products/{slug}
pub async fn get_product(
    service: web::Data<Arc<CatalogService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let product = service.get_product_by_slug(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

/// Configure catalog routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/brands")
            .route("", web::post().to(create_brand))
            .route("", web::get().to(list_brands))
            .route("/{id}", web::patch().to(update_brand)),
    )
    .service(
        web::scope("/categories")
            .route("", web::post().to(create_category))
            .route("", web::get().to(list_categories))
            .route("/{id}", web::patch().to(update_category)),
    )
    .service(
        web::scope("/products")
            .route("", web::post().to(create_product))
            .route("", web::get().to(list_products))
            .route("/{slug}", web::get().to(get_product))
            .route("/{id}", web::patch().to(update_product)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let query: ListProductsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 50);
        assert_eq!(query.offset, 0);
        assert!(query.category_id.is_none());
    }
}
