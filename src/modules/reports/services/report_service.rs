use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use tracing::info;

use crate::core::{AppError, Result};
use crate::modules::reports::models::{
    aggregate_paid_items, MonthlyReport, RangeReport, YearlyReport,
};
use crate::modules::reports::repositories::ReportRepository;

/// Sales rollups over paid orders.
///
/// Every recompute is a full rescan of the period's paid orders followed by
/// an upsert, so the stored rows are always reproducible from order data
/// and safe to refresh on every qualifying order write.
pub struct ReportService {
    report_repo: ReportRepository,
}

impl ReportService {
    pub fn new(report_repo: ReportRepository) -> Self {
        Self { report_repo }
    }

    /// Recompute and store the rollup for a "YYYY-MM" period
    pub async fn recompute_monthly(&self, period: &str) -> Result<MonthlyReport> {
        let (year, month) = parse_period(period)?;
        let start = first_of_month(year, month)?;
        let end = next_month(year, month)?;

        let rows = self.report_repo.paid_items_between(start, end).await?;
        let totals = aggregate_paid_items(&rows);

        info!(
            period = %period,
            orders = totals.total_orders,
            income = %totals.total_income,
            "Monthly report recomputed"
        );

        self.report_repo.upsert_monthly(period, &totals).await?;

        self.report_repo
            .find_monthly(period)
            .await?
            .ok_or_else(|| AppError::internal("Monthly report missing after upsert"))
    }

    /// Recompute and store the rollup for a calendar year
    pub async fn recompute_yearly(&self, year: i32) -> Result<YearlyReport> {
        let start = first_of_month(year, 1)?;
        let end = first_of_month(year + 1, 1)?;

        let rows = self.report_repo.paid_items_between(start, end).await?;
        let totals = aggregate_paid_items(&rows);

        info!(
            year = year,
            orders = totals.total_orders,
            income = %totals.total_income,
            "Yearly report recomputed"
        );

        self.report_repo.upsert_yearly(year, &totals).await?;

        self.report_repo
            .find_yearly(year)
            .await?
            .ok_or_else(|| AppError::internal("Yearly report missing after upsert"))
    }

    /// Refresh the rollups covering an order's creation instant; called
    /// after a payment resolves to paid. Callers treat failures as
    /// non-fatal.
    pub async fn recompute_for_order_date(&self, created_at: DateTime<Utc>) -> Result<()> {
        let period = format!("{:04}-{:02}", created_at.year(), created_at.month());
        self.recompute_monthly(&period).await?;
        self.recompute_yearly(created_at.year()).await?;
        Ok(())
    }

    /// Stored monthly rollup, computing it on first read
    pub async fn get_monthly(&self, period: &str) -> Result<MonthlyReport> {
        parse_period(period)?;

        if let Some(report) = self.report_repo.find_monthly(period).await? {
            return Ok(report);
        }

        self.recompute_monthly(period).await
    }

    /// Stored yearly rollup, computing it on first read
    pub async fn get_yearly(&self, year: i32) -> Result<YearlyReport> {
        if let Some(report) = self.report_repo.find_yearly(year).await? {
            return Ok(report);
        }

        self.recompute_yearly(year).await
    }

    pub async fn list_monthly(&self) -> Result<Vec<MonthlyReport>> {
        self.report_repo.list_monthly().await
    }

    pub async fn list_yearly(&self) -> Result<Vec<YearlyReport>> {
        self.report_repo.list_yearly().await
    }

    /// Ad-hoc report over an inclusive date range; not persisted
    pub async fn range_report(&self, start_date: NaiveDate, end_date: NaiveDate) -> Result<RangeReport> {
        if start_date > end_date {
            return Err(AppError::validation(format!(
                "start_date ({}) must be before or equal to end_date ({})",
                start_date, end_date
            )));
        }

        let rows = self
            .report_repo
            .paid_items_between(start_date, end_date + Duration::days(1))
            .await?;
        let totals = aggregate_paid_items(&rows);

        Ok(RangeReport {
            start_date,
            end_date,
            totals,
        })
    }
}

fn parse_period(period: &str) -> Result<(i32, u32)> {
    let parts: Vec<&str> = period.split('-').collect();
    if parts.len() != 2 {
        return Err(AppError::validation(format!(
            "Invalid period '{}', expected YYYY-MM",
            period
        )));
    }

    let year: i32 = parts[0]
        .parse()
        .map_err(|_| AppError::validation(format!("Invalid year in period '{}'", period)))?;
    let month: u32 = parts[1]
        .parse()
        .map_err(|_| AppError::validation(format!("Invalid month in period '{}'", period)))?;

    if !(1..=12).contains(&month) {
        return Err(AppError::validation(format!(
            "Invalid month in period '{}'",
            period
        )));
    }

    Ok((year, month))
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::validation(format!("Invalid period {}-{:02}", year, month)))
}

fn next_month(year: i32, month: u32) -> Result<NaiveDate> {
    if month == 12 {
        first_of_month(year + 1, 1)
    } else {
        first_of_month(year, month + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period() {
        assert_eq!(parse_period("2025-03").unwrap(), (2025, 3));
        assert_eq!(parse_period("2024-12").unwrap(), (2024, 12));
        assert!(parse_period("2025-13").is_err());
        assert!(parse_period("2025").is_err());
        assert!(parse_period("march-2025").is_err());
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(
            next_month(2025, 12).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
        );
        assert_eq!(
            next_month(2025, 6).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
        );
    }
}
