use std::sync::Arc;

use serde::Serialize;

use crate::core::{AppError, Result};
use crate::modules::notifications::Mailer;
use crate::modules::orders::models::OrderStatus;
use crate::modules::orders::repositories::OrderRepository;
use crate::modules::payments::models::{CallbackOutcome, PaymentStatus};
use crate::modules::payments::repositories::PaymentRepository;
use crate::modules::reports::services::ReportService;

/// Result of a gateway callback.
///
/// `already_processed` marks a replay that was absorbed without touching
/// anything: no status change, no stock movement (stock was deducted at
/// order creation), no second email.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackResult {
    pub order_id: String,
    pub payment_status: PaymentStatus,
    pub already_processed: bool,
}

/// Reconciles gateway callbacks against payments and their orders.
///
/// The payment row is locked while a callback is applied, so the three
/// outcomes are mutually exclusive per transaction id and replays no-op
/// against the terminal state.
pub struct PaymentService {
    payment_repo: PaymentRepository,
    order_repo: OrderRepository,
    mailer: Arc<dyn Mailer>,
    reports: Arc<ReportService>,
}

impl PaymentService {
    pub fn new(
        payment_repo: PaymentRepository,
        order_repo: OrderRepository,
        mailer: Arc<dyn Mailer>,
        reports: Arc<ReportService>,
    ) -> Self {
        Self {
            payment_repo,
            order_repo,
            mailer,
            reports,
        }
    }

    pub async fn handle_callback(
        &self,
        tran_id: &str,
        outcome: CallbackOutcome,
        raw_payload: serde_json::Value,
    ) -> Result<CallbackResult> {
        let mut tx = self
            .payment_repo
            .pool()
            .begin()
            .await
            .map_err(AppError::Database)?;

        let payment = self
            .payment_repo
            .find_by_tran_id_for_update(&mut tx, tran_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("No payment for transaction '{}'", tran_id))
            })?;

        if payment.status.is_terminal() {
            tx.rollback().await.map_err(AppError::Database)?;
            tracing::info!(
                tran_id = %tran_id,
                status = %payment.status,
                "Replayed callback ignored"
            );
            return Ok(CallbackResult {
                order_id: payment.order_id,
                payment_status: payment.status,
                already_processed: true,
            });
        }

        let payment_status = outcome.payment_status();
        let order_status = match outcome {
            CallbackOutcome::Success => OrderStatus::Confirmed,
            CallbackOutcome::Fail | CallbackOutcome::Cancel => OrderStatus::Cancelled,
        };

        // The raw gateway body is stored verbatim for audit
        self.payment_repo
            .resolve_with_tx(&mut tx, &payment.id, payment_status, &raw_payload)
            .await?;
        self.order_repo
            .update_statuses_with_tx(&mut tx, &payment.order_id, payment_status, order_status)
            .await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            tran_id = %tran_id,
            order_id = %payment.order_id,
            outcome = ?outcome,
            "Payment callback applied"
        );

        self.notify_customer(&payment.order_id, outcome).await;

        if outcome == CallbackOutcome::Success {
            if let Some(order) = self.order_repo.find_by_id(&payment.order_id).await? {
                if let Err(e) = self.reports.recompute_for_order_date(order.created_at).await {
                    tracing::warn!(order_id = %order.id, error = %e, "Report recompute failed");
                }
            }
        }

        Ok(CallbackResult {
            order_id: payment.order_id,
            payment_status,
            already_processed: false,
        })
    }

    /// Distinct best-effort email per outcome
    async fn notify_customer(&self, order_id: &str, outcome: CallbackOutcome) {
        let order = match self.order_repo.find_by_id(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(order_id = %order_id, error = %e, "Could not load order for email");
                return;
            }
        };

        let email = match self.customer_email(&order.user_id).await {
            Ok(email) => email,
            Err(e) => {
                tracing::warn!(order_id = %order_id, error = %e, "Could not resolve customer email");
                return;
            }
        };

        let (subject, line) = match outcome {
            CallbackOutcome::Success => (
                format!("Payment received - {}", order.order_number),
                "We have received your payment.",
            ),
            CallbackOutcome::Fail => (
                format!("Payment failed - {}", order.order_number),
                "Your payment could not be processed. Please try again.",
            ),
            CallbackOutcome::Cancel => (
                format!("Payment cancelled - {}", order.order_number),
                "Your payment has been cancelled. If this was a mistake, please place the order again.",
            ),
        };

        let body = format!(
            "Dear {},\n\n{}\n\nOrder number: {}\nTotal: {} BDT\n\nThank you!",
            order.shipping_name, line, order.order_number, order.total_amount
        );

        if let Err(e) = self.mailer.send(&email, &subject, &body).await {
            tracing::warn!(order_id = %order_id, error = %e, "Failed to send payment email");
        }
    }

    async fn customer_email(&self, user_id: &str) -> Result<String> {
        let row: (String,) = sqlx::query_as("SELECT email FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(self.payment_repo.pool())
            .await
            .map_err(AppError::Database)?;
        Ok(row.0)
    }
}
