use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::carts::models::CartItem;
use crate::modules::carts::repositories::CartRepository;
use crate::modules::catalog::repositories::ProductRepository;
use crate::modules::catalog::services::pricing::validate_image_size;
use crate::modules::notifications::Mailer;
use crate::modules::prescriptions::models::{
    PrescriptionItem, PrescriptionItemView, PrescriptionRequest, PrescriptionStatus,
    PrescriptionView, SubmitPrescriptionRequest,
};
use crate::modules::prescriptions::repositories::PrescriptionRepository;

/// What a review call did: `Transitioned` fired the side effects,
/// `AlreadyTerminal` absorbed a duplicate click or retry as a no-op
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    Transitioned,
    AlreadyTerminal,
}

/// Prescription intake and review workflow.
///
/// Approve and reject are the only ways out of `pending`. Both lock the
/// request row, absorb repeats against terminal states, and fire their
/// side effects (cart injection, email) exactly once. Email is
/// best-effort: the transition is already committed when it is sent, and
/// a delivery failure is logged, never rolled back.
pub struct PrescriptionService {
    prescription_repo: PrescriptionRepository,
    cart_repo: CartRepository,
    product_repo: ProductRepository,
    mailer: Arc<dyn Mailer>,
}

impl PrescriptionService {
    pub fn new(
        prescription_repo: PrescriptionRepository,
        cart_repo: CartRepository,
        product_repo: ProductRepository,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            prescription_repo,
            cart_repo,
            product_repo,
            mailer,
        }
    }

    /// Create a pending request from a user upload
    pub async fn submit(
        &self,
        user_id: &str,
        user_email: &str,
        request: SubmitPrescriptionRequest,
    ) -> Result<PrescriptionView> {
        if request.items.is_empty() {
            return Err(AppError::validation(
                "Prescription request must contain at least one item",
            ));
        }

        let upload_url = match request.upload {
            Some(upload) => {
                validate_image_size(upload.size_bytes)?;
                Some(upload.url)
            }
            None => None,
        };

        let now = Utc::now();
        let record = PrescriptionRequest {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            status: PrescriptionStatus::Pending,
            upload_url,
            notes: request.notes,
            admin_notes: None,
            reviewed_by: None,
            reviewed_at: None,
            auto_add_to_cart: request.auto_add_to_cart,
            created_at: now,
            updated_at: now,
        };

        let mut items = Vec::with_capacity(request.items.len());
        for input in &request.items {
            if input.quantity == 0 {
                return Err(AppError::validation("Item quantity must be at least 1"));
            }

            let product = self
                .product_repo
                .find_by_id(&input.product_id)
                .await?
                .ok_or_else(|| {
                    AppError::validation(format!("Product '{}' does not exist", input.product_id))
                })?;

            if !product.is_active {
                return Err(AppError::validation(format!(
                    "Product '{}' is not available",
                    product.name
                )));
            }

            items.push(PrescriptionItem {
                id: Uuid::new_v4().to_string(),
                prescription_request_id: record.id.clone(),
                product_id: product.id,
                quantity: input.quantity,
                note: input.note.clone(),
            });
        }

        self.prescription_repo.create(&record, &items).await?;

        tracing::info!(
            request_id = %record.id,
            user_id = %user_id,
            items = items.len(),
            "Prescription request submitted"
        );

        let item_views = self.prescription_repo.items_with_products(&record.id).await?;

        // Heads-up to the admin mailbox; intake succeeds even if this fails
        let admin_address = self.mailer.admin_address().to_string();
        if let Err(e) = self
            .mailer
            .send(
                &admin_address,
                &format!("New prescription request #{}", record.id),
                &format!(
                    "User {} has uploaded a new prescription.\n\nProducts:\n{}\n\nPlease review it in the admin panel.",
                    user_email,
                    product_table(&item_views)
                ),
            )
            .await
        {
            tracing::warn!(request_id = %record.id, error = %e, "Failed to send intake email");
        }

        Ok(PrescriptionView {
            request: record,
            items: item_views,
        })
    }

    /// Approve a pending request.
    ///
    /// Within one transaction (request row locked): record reviewer and
    /// timestamp, then inject every item into the requester's active cart,
    /// merging quantities and snapshotting the price that is current *now*,
    /// not the price at request time. Terminal requests no-op.
    pub async fn approve(
        &self,
        request_id: &str,
        reviewer_id: &str,
        admin_notes: Option<String>,
    ) -> Result<(PrescriptionView, ReviewOutcome)> {
        let mut tx = self
            .prescription_repo
            .pool()
            .begin()
            .await
            .map_err(AppError::Database)?;

        let request = self
            .prescription_repo
            .find_by_id_for_update(&mut tx, request_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Prescription request '{}' not found", request_id))
            })?;

        if request.status.is_terminal() {
            tx.rollback().await.map_err(AppError::Database)?;
            tracing::info!(
                request_id = %request_id,
                status = %request.status,
                "Approve on terminal request ignored"
            );
            let view = self.load_view(request).await?;
            return Ok((view, ReviewOutcome::AlreadyTerminal));
        }

        let reviewed_at = Utc::now();
        self.prescription_repo
            .record_review(
                &mut tx,
                request_id,
                PrescriptionStatus::Approved,
                reviewer_id,
                reviewed_at,
                admin_notes.as_deref(),
            )
            .await?;

        if request.auto_add_to_cart {
            let items = self
                .prescription_repo
                .items_for_update(&mut tx, request_id)
                .await?;

            let cart = self
                .cart_repo
                .get_or_create_active_tx(&mut tx, &request.user_id)
                .await?;

            for item in &items {
                let product = self
                    .prescription_repo
                    .product_pricing(&mut tx, &item.product_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::internal(format!(
                            "Product '{}' on request '{}' no longer exists",
                            item.product_id, request_id
                        ))
                    })?;

                let line = CartItem {
                    id: Uuid::new_v4().to_string(),
                    cart_id: cart.id.clone(),
                    product_id: product.id.clone(),
                    quantity: item.quantity,
                    unit_price: product.effective_price(),
                    prescription_request_id: Some(request_id.to_string()),
                    added_at: reviewed_at,
                };

                self.cart_repo
                    .insert_or_increment_item_tx(&mut tx, &line)
                    .await?;
            }
        }

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            request_id = %request_id,
            reviewer = %reviewer_id,
            "Prescription request approved"
        );

        let mut approved = request;
        approved.status = PrescriptionStatus::Approved;
        approved.reviewed_by = Some(reviewer_id.to_string());
        approved.reviewed_at = Some(reviewed_at);
        if admin_notes.is_some() {
            approved.admin_notes = admin_notes;
        }

        let view = self.load_view(approved).await?;
        self.notify_requester(&view, "approved").await;

        Ok((view, ReviewOutcome::Transitioned))
    }

    /// Reject a pending request; records the reviewer and optional reason,
    /// no cart mutation. Terminal requests no-op.
    pub async fn reject(
        &self,
        request_id: &str,
        reviewer_id: &str,
        admin_notes: Option<String>,
    ) -> Result<(PrescriptionView, ReviewOutcome)> {
        let mut tx = self
            .prescription_repo
            .pool()
            .begin()
            .await
            .map_err(AppError::Database)?;

        let request = self
            .prescription_repo
            .find_by_id_for_update(&mut tx, request_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Prescription request '{}' not found", request_id))
            })?;

        if request.status.is_terminal() {
            tx.rollback().await.map_err(AppError::Database)?;
            tracing::info!(
                request_id = %request_id,
                status = %request.status,
                "Reject on terminal request ignored"
            );
            let view = self.load_view(request).await?;
            return Ok((view, ReviewOutcome::AlreadyTerminal));
        }

        let reviewed_at = Utc::now();
        self.prescription_repo
            .record_review(
                &mut tx,
                request_id,
                PrescriptionStatus::Rejected,
                reviewer_id,
                reviewed_at,
                admin_notes.as_deref(),
            )
            .await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            request_id = %request_id,
            reviewer = %reviewer_id,
            "Prescription request rejected"
        );

        let mut rejected = request;
        rejected.status = PrescriptionStatus::Rejected;
        rejected.reviewed_by = Some(reviewer_id.to_string());
        rejected.reviewed_at = Some(reviewed_at);
        if admin_notes.is_some() {
            rejected.admin_notes = admin_notes;
        }

        let view = self.load_view(rejected).await?;
        self.notify_requester(&view, "rejected").await;

        Ok((view, ReviewOutcome::Transitioned))
    }

    pub async fn get(&self, request_id: &str) -> Result<PrescriptionView> {
        let request = self
            .prescription_repo
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Prescription request '{}' not found", request_id))
            })?;

        self.load_view(request).await
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<PrescriptionRequest>> {
        self.prescription_repo.list_for_user(user_id).await
    }

    pub async fn list_all(
        &self,
        status: Option<PrescriptionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PrescriptionRequest>> {
        self.prescription_repo.list_all(status, limit, offset).await
    }

    async fn load_view(&self, request: PrescriptionRequest) -> Result<PrescriptionView> {
        let items = self.prescription_repo.items_with_products(&request.id).await?;
        Ok(PrescriptionView { request, items })
    }

    /// One outcome email to the requester; failures are logged only
    async fn notify_requester(&self, view: &PrescriptionView, verdict: &str) {
        let email = match self.requester_email(&view.request.user_id).await {
            Ok(email) => email,
            Err(e) => {
                tracing::warn!(
                    request_id = %view.request.id,
                    error = %e,
                    "Could not resolve requester email"
                );
                return;
            }
        };

        let notes = view
            .request
            .admin_notes
            .clone()
            .unwrap_or_else(|| "None".to_string());

        let body = format!(
            "Hello,\n\nYour prescription request has been {}.\n\nProducts:\n{}\n\nNotes from admin: {}",
            verdict,
            product_table(&view.items),
            notes
        );

        if let Err(e) = self
            .mailer
            .send(
                &email,
                &format!("Prescription request #{} {}", view.request.id, verdict),
                &body,
            )
            .await
        {
            tracing::warn!(
                request_id = %view.request.id,
                error = %e,
                "Failed to send review outcome email"
            );
        }
    }

    async fn requester_email(&self, user_id: &str) -> Result<String> {
        let row: (String,) = sqlx::query_as("SELECT email FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(self.prescription_repo.pool())
            .await
            .map_err(AppError::Database)?;
        Ok(row.0)
    }
}

fn product_table(items: &[PrescriptionItemView]) -> String {
    let mut lines = vec![
        "Product Name | SKU | Quantity".to_string(),
        "-----------------------------".to_string(),
    ];
    for item in items {
        lines.push(format!(
            "{} | {} | {}",
            item.product_name, item.product_sku, item.quantity
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, sku: &str, quantity: u32) -> PrescriptionItemView {
        PrescriptionItemView {
            id: Uuid::new_v4().to_string(),
            product_id: Uuid::new_v4().to_string(),
            product_name: name.to_string(),
            product_sku: sku.to_string(),
            quantity,
            note: None,
        }
    }

    #[test]
    fn test_product_table_layout() {
        let table = product_table(&[item("Napa 500", "NAPA-500", 2), item("Seclo 20", "SECLO-20", 1)]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Product Name | SKU | Quantity");
        assert_eq!(lines[2], "Napa 500 | NAPA-500 | 2");
        assert_eq!(lines[3], "Seclo 20 | SECLO-20 | 1");
    }
}
