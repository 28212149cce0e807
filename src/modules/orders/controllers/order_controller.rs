use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::error::AppError;
use crate::middleware::auth::{AdminUser, CurrentUser};
use crate::modules::orders::models::{PlaceOrderRequest, UpdateOrderStatusRequest};
use crate::modules::orders::services::OrderService;

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// POST /orders
pub async fn place_order(
    service: web::Data<Arc<OrderService>>,
    user: CurrentUser,
    request: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let response = service.place_order(&user, request.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

/// GET /orders
pub async fn list_orders(
    service: web::Data<Arc<OrderService>>,
    user: CurrentUser,
    query: web::Query<ListOrdersQuery>,
) -> Result<HttpResponse, AppError> {
    let orders = service.list_orders(&user, query.limit, query.offset).await?;
    Ok(HttpResponse::Ok().json(orders))
}

/// GET /orders/{id}
pub async fn get_order(
    service: web::Data<Arc<OrderService>>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order = service.get_order(&user, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// PATCH /orders/{id}/status (admin)
pub async fn update_status(
    service: web::Data<Arc<OrderService>>,
    _admin: AdminUser,
    path: web::Path<String>,
    request: web::Json<UpdateOrderStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order = service
        .update_status(&path.into_inner(), request.status)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

/// Configure order routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(place_order))
            .route("", web::get().to(list_orders))
            .route("/{id}", web::get().to(get_order))
            .route("/{id}/status", web::patch().to(update_status)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let query: ListOrdersQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 50);
        assert_eq!(query.offset, 0);
    }
}
