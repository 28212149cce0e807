use std::collections::HashMap;
use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::core::error::AppError;
use crate::modules::payments::models::CallbackOutcome;
use crate::modules::payments::services::PaymentService;

/// Gateway callbacks arrive as form posts; the body is stored verbatim
/// alongside the payment for audit.
async fn handle(
    service: &PaymentService,
    outcome: CallbackOutcome,
    form: HashMap<String, String>,
) -> Result<HttpResponse, AppError> {
    let tran_id = form
        .get("tran_id")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::validation("tran_id missing"))?
        .to_string();

    let raw_payload = serde_json::to_value(&form)?;
    let result = service.handle_callback(&tran_id, outcome, raw_payload).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": result.payment_status,
        "order_id": result.order_id,
        "already_processed": result.already_processed,
    })))
}

/// POST /payments/success
pub async fn payment_success(
    service: web::Data<Arc<PaymentService>>,
    form: web::Form<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    handle(&service, CallbackOutcome::Success, form.into_inner()).await
}

/// POST /payments/fail
pub async fn payment_fail(
    service: web::Data<Arc<PaymentService>>,
    form: web::Form<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    handle(&service, CallbackOutcome::Fail, form.into_inner()).await
}

/// POST /payments/cancel
pub async fn payment_cancel(
    service: web::Data<Arc<PaymentService>>,
    form: web::Form<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    handle(&service, CallbackOutcome::Cancel, form.into_inner()).await
}

/// Webhook routes; the gateway calls these, so they sit outside the
/// bearer-auth scope
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("/success", web::post().to(payment_success))
            .route("/fail", web::post().to(payment_fail))
            .route("/cancel", web::post().to(payment_cancel)),
    );
}
