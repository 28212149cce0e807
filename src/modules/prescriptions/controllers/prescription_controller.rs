use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::error::AppError;
use crate::middleware::auth::{AdminUser, CurrentUser};
use crate::modules::prescriptions::models::{
    PrescriptionStatus, ReviewRequest, SubmitPrescriptionRequest,
};
use crate::modules::prescriptions::services::PrescriptionService;

#[derive(Debug, Deserialize)]
pub struct ListPrescriptionsQuery {
    pub status: Option<PrescriptionStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// POST /prescriptions
pub async fn submit(
    service: web::Data<Arc<PrescriptionService>>,
    user: CurrentUser,
    request: web::Json<SubmitPrescriptionRequest>,
) -> Result<HttpResponse, AppError> {
    let view = service
        .submit(&user.id, &user.email, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(view))
}

/// GET /prescriptions — own requests, or all of them for admins
pub async fn list(
    service: web::Data<Arc<PrescriptionService>>,
    user: CurrentUser,
    query: web::Query<ListPrescriptionsQuery>,
) -> Result<HttpResponse, AppError> {
    let requests = if user.is_admin() {
        service
            .list_all(query.status, query.limit, query.offset)
            .await?
    } else {
        service.list_for_user(&user.id).await?
    };

    Ok(HttpResponse::Ok().json(requests))
}

/// GET /prescriptions/{id}
pub async fn get(
    service: web::Data<Arc<PrescriptionService>>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let view = service.get(&path.into_inner()).await?;

    if view.request.user_id != user.id && !user.is_admin() {
        return Err(AppError::forbidden(
            "Prescription request does not belong to you",
        ));
    }

    Ok(HttpResponse::Ok().json(view))
}

/// POST /prescriptions/{id}/approve (admin)
pub async fn approve(
    service: web::Data<Arc<PrescriptionService>>,
    admin: AdminUser,
    path: web::Path<String>,
    request: Option<web::Json<ReviewRequest>>,
) -> Result<HttpResponse, AppError> {
    let notes = request.and_then(|r| r.into_inner().admin_notes);
    let (view, _outcome) = service
        .approve(&path.into_inner(), &admin.0.id, notes)
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

/// POST /prescriptions/{id}/reject (admin)
pub async fn reject(
    service: web::Data<Arc<PrescriptionService>>,
    admin: AdminUser,
    path: web::Path<String>,
    request: Option<web::Json<ReviewRequest>>,
) -> Result<HttpResponse, AppError> {
    let notes = request.and_then(|r| r.into_inner().admin_notes);
    let (view, _outcome) = service
        .reject(&path.into_inner(), &admin.0.id, notes)
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Configure prescription routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/prescriptions")
            .route("", web::post().to(submit))
            .route("", web::get().to(list))
            .route("/{id}", web::get().to(get))
            .route("/{id}/approve", web::post().to(approve))
            .route("/{id}/reject", web::post().to(reject)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_parses_status() {
        let query: ListPrescriptionsQuery =
            serde_json::from_str(r#"{"status": "pending"}"#).unwrap();
        assert_eq!(query.status, Some(PrescriptionStatus::Pending));
        assert_eq!(query.limit, 50);
    }
}
