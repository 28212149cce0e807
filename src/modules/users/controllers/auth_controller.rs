use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::core::error::AppError;
use crate::middleware::auth::{AdminUser, CurrentUser};
use crate::middleware::rate_limit::RateLimiter;
use crate::modules::users::models::{
    LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest, ResendOtpRequest,
    UpdateProfileRequest, VerifyOtpRequest,
};
use crate::modules::users::services::AuthService;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// POST /auth/register
pub async fn register(
    service: web::Data<Arc<AuthService>>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let profile = service.register(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Registered. Check your email for the OTP code.",
        "user": profile,
    })))
}

/// POST /auth/verify-otp
pub async fn verify_otp(
    service: web::Data<Arc<AuthService>>,
    request: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let profile = service.verify_otp(&request.email, &request.otp_code).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Account verified. You can now log in.",
        "user": profile,
    })))
}

/// POST /auth/resend-otp (rate limited)
pub async fn resend_otp(
    service: web::Data<Arc<AuthService>>,
    request: web::Json<ResendOtpRequest>,
) -> Result<HttpResponse, AppError> {
    service.resend_otp(&request.email).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "OTP sent." })))
}

/// POST /auth/login
pub async fn login(
    service: web::Data<Arc<AuthService>>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let (profile, tokens) = service.login(&request.email, &request.password).await?;
    Ok(HttpResponse::Ok().json(json!({
        "user": profile,
        "tokens": tokens,
    })))
}

/// POST /auth/refresh
pub async fn refresh(
    service: web::Data<Arc<AuthService>>,
    request: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
    let tokens = service.refresh(&request.refresh_token).await?;
    Ok(HttpResponse::Ok().json(tokens))
}

/// POST /auth/logout
pub async fn logout(
    service: web::Data<Arc<AuthService>>,
    request: web::Json<LogoutRequest>,
) -> Result<HttpResponse, AppError> {
    service.logout(&request.refresh_token).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out." })))
}

/// GET /profile
pub async fn get_profile(
    service: web::Data<Arc<AuthService>>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let profile = service.get_profile(&user.id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// PATCH /profile
pub async fn update_profile(
    service: web::Data<Arc<AuthService>>,
    user: CurrentUser,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let profile = service.update_profile(&user.id, request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// GET /users (admin)
pub async fn list_users(
    service: web::Data<Arc<AuthService>>,
    _admin: AdminUser,
    query: web::Query<ListUsersQuery>,
) -> Result<HttpResponse, AppError> {
    let users = service.list_users(query.limit, query.offset).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Configure auth, profile, and user-admin routes.
///
/// The OTP resend endpoint carries its own rate limit so mail floods die
/// at the edge.
pub fn configure(otp_requests_per_minute: u32) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.service(
            web::scope("/auth")
                .service(
                    web::resource("/resend-otp")
                        .wrap(RateLimiter::new(otp_requests_per_minute))
                        .route(web::post().to(resend_otp)),
                )
                .route("/register", web::post().to(register))
                .route("/verify-otp", web::post().to(verify_otp))
                .route("/login", web::post().to(login))
                .route("/refresh", web::post().to(refresh))
                .route("/logout", web::post().to(logout)),
        )
        .route("/profile", web::get().to(get_profile))
        .route("/profile", web::patch().to(update_profile))
        .route("/users", web::get().to(list_users));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_users_query_defaults() {
        let query: ListUsersQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 50);
        assert_eq!(query.offset, 0);
    }
}
