use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::core::error::AppError;
use crate::middleware::auth::CurrentUser;
use crate::modules::carts::models::{AddItemRequest, UpdateQuantityRequest};
use crate::modules::carts::services::CartService;

/// GET /cart
pub async fn get_cart(
    service: web::Data<Arc<CartService>>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let cart = service.get_cart(&user.id).await?;
    Ok(HttpResponse::Ok().json(cart))
}

/// POST /cart/items
pub async fn add_item(
    service: web::Data<Arc<CartService>>,
    user: CurrentUser,
    request: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let cart = service
        .add_item(&user.id, &request.product_id, request.quantity)
        .await?;
    Ok(HttpResponse::Created().json(cart))
}

/// PATCH /cart/items/{id}
pub async fn update_quantity(
    service: web::Data<Arc<CartService>>,
    user: CurrentUser,
    path: web::Path<String>,
    request: web::Json<UpdateQuantityRequest>,
) -> Result<HttpResponse, AppError> {
    let cart = service
        .update_quantity(&user.id, &path.into_inner(), request.quantity)
        .await?;
    Ok(HttpResponse::Ok().json(cart))
}

/// DELETE /cart/items/{id}
pub async fn remove_item(
    service: web::Data<Arc<CartService>>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let cart = service.remove_item(&user.id, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

/// Configure cart routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cart")
            .route("", web::get().to(get_cart))
            .route("/items", web::post().to(add_item))
            .route("/items/{id}", web::patch().to(update_quantity))
            .route("/items/{id}", web::delete().to(remove_item)),
    );
}
