use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::core::error::AppError;
use crate::middleware::auth::AdminUser;
use crate::modules::reports::services::{products_csv, ReportService};

#[derive(Debug, Deserialize)]
pub struct RangeReportQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// "json" (default) or "csv"
    pub format: Option<String>,
}

/// GET /reports/monthly (admin)
pub async fn list_monthly(
    service: web::Data<Arc<ReportService>>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let reports = service.list_monthly().await?;
    Ok(HttpResponse::Ok().json(reports))
}

/// GET /reports/monthly/{period} (admin), period formatted YYYY-MM
pub async fn get_monthly(
    service: web::Data<Arc<ReportService>>,
    _admin: AdminUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let report = service.get_monthly(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// GET /reports/yearly (admin)
pub async fn list_yearly(
    service: web::Data<Arc<ReportService>>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let reports = service.list_yearly().await?;
    Ok(HttpResponse::Ok().json(reports))
}

/// GET /reports/yearly/{year} (admin)
pub async fn get_yearly(
    service: web::Data<Arc<ReportService>>,
    _admin: AdminUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let report = service.get_yearly(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// GET /reports/range?start=…&end=…&format=csv (admin)
pub async fn range_report(
    service: web::Data<Arc<ReportService>>,
    _admin: AdminUser,
    query: web::Query<RangeReportQuery>,
) -> Result<HttpResponse, AppError> {
    let report = service.range_report(query.start, query.end).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = products_csv(&report.totals.products_details)?;
        return Ok(HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                "Content-Disposition",
                format!(
                    "attachment; filename=\"sales-{}-{}.csv\"",
                    report.start_date, report.end_date
                ),
            ))
            .body(csv));
    }

    Ok(HttpResponse::Ok().json(report))
}

/// Configure report routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/reports")
            .route("/monthly", web::get().to(list_monthly))
            .route("/monthly/{period}", web::get().to(get_monthly))
            .route("/yearly", web::get().to(list_yearly))
            .route("/yearly/{year}", web::get().to(get_yearly))
            .route("/range", web::get().to(range_report)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_query_parsing() {
        let query: RangeReportQuery =
            serde_json::from_str(r#"{"start": "2025-01-01", "end": "2025-01-31", "format": "csv"}"#)
                .unwrap();
        assert_eq!(query.start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(query.format.as_deref(), Some("csv"));
    }
}
