use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::core::{AppError, Currency, Result};
use crate::middleware::auth::CurrentUser;
use crate::modules::carts::repositories::CartRepository;
use crate::modules::catalog::repositories::ProductRepository;
use crate::modules::notifications::Mailer;
use crate::modules::orders::models::{
    generate_order_number, generate_tran_id, order_total, Order, OrderItem, OrderStatus, OrderView,
    PaymentMethod, PlaceOrderRequest, PlaceOrderResponse, ShippingInfo,
};
use crate::modules::orders::repositories::OrderRepository;
use crate::modules::payments::models::{Payment, PaymentStatus};
use crate::modules::payments::repositories::PaymentRepository;
use crate::modules::payments::services::{PaymentGateway, SessionRequest};
use crate::modules::reports::services::ReportService;

/// Order placement and fulfillment.
///
/// Placement converts the caller's active cart into an immutable order in
/// one transaction: snapshot lines, conditional stock decrements, cart
/// deactivation, and a pending payment all commit together. Stock comes
/// off at order time, not at payment time, so the payment-pending window
/// cannot oversell.
pub struct OrderService {
    order_repo: OrderRepository,
    cart_repo: CartRepository,
    product_repo: ProductRepository,
    payment_repo: PaymentRepository,
    gateway: Arc<dyn PaymentGateway>,
    mailer: Arc<dyn Mailer>,
    reports: Arc<ReportService>,
    app: AppConfig,
}

impl OrderService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_repo: OrderRepository,
        cart_repo: CartRepository,
        product_repo: ProductRepository,
        payment_repo: PaymentRepository,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
        reports: Arc<ReportService>,
        app: AppConfig,
    ) -> Self {
        Self {
            order_repo,
            cart_repo,
            product_repo,
            payment_repo,
            gateway,
            mailer,
            reports,
            app,
        }
    }

    pub async fn place_order(
        &self,
        user: &CurrentUser,
        request: PlaceOrderRequest,
    ) -> Result<PlaceOrderResponse> {
        validate_shipping(&request.shipping)?;

        let mut tx = self
            .order_repo
            .pool()
            .begin()
            .await
            .map_err(AppError::Database)?;

        // Cart row locked for the whole placement; a double-submitted
        // "place order" serializes here and the second call sees an
        // empty, deactivated cart
        let cart = self
            .cart_repo
            .find_active_for_update(&mut tx, &user.id)
            .await?
            .ok_or(AppError::EmptyCart)?;

        let cart_items = self.cart_repo.items_for_update(&mut tx, &cart.id).await?;
        if cart_items.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();
        let mut items = Vec::with_capacity(cart_items.len());

        for cart_item in &cart_items {
            let decremented = self
                .product_repo
                .try_decrement_stock(&mut tx, &cart_item.product_id, cart_item.quantity)
                .await?;

            let (product_name, actual_price) = self
                .product_repo
                .order_snapshot(&mut tx, &cart_item.product_id)
                .await?
                .ok_or_else(|| {
                    AppError::internal(format!(
                        "Product '{}' vanished during order placement",
                        cart_item.product_id
                    ))
                })?;

            if !decremented {
                let available = self
                    .product_repo
                    .stock_for_update(&mut tx, &cart_item.product_id)
                    .await?;

                // Transaction dropped without commit: no order, no stock
                // mutation
                return Err(AppError::InsufficientStock {
                    product: product_name,
                    requested: cart_item.quantity,
                    available,
                });
            }

            let subtotal = cart_item.unit_price * Decimal::from(cart_item.quantity);
            items.push(OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                product_id: cart_item.product_id.clone(),
                product_name,
                unit_price: cart_item.unit_price,
                actual_price,
                quantity: cart_item.quantity,
                subtotal,
            });
        }

        let total_amount = order_total(&items);
        let tran_id = generate_tran_id(now);

        let order = Order {
            id: order_id.clone(),
            order_number: generate_order_number(now),
            user_id: user.id.clone(),
            shipping_name: request.shipping.name.trim().to_string(),
            shipping_phone: request.shipping.phone.trim().to_string(),
            shipping_address: request.shipping.address.trim().to_string(),
            shipping_city: request.shipping.city.trim().to_string(),
            payment_method: request.payment_method,
            tran_id: tran_id.clone(),
            total_amount,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.order_repo.create_with_tx(&mut tx, &order, &items).await?;
        self.cart_repo.deactivate(&mut tx, &cart.id).await?;

        let gateway_id = match request.payment_method {
            PaymentMethod::Cod => "cod".to_string(),
            PaymentMethod::Gateway => self.gateway.name().to_string(),
        };

        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.clone(),
            gateway_id,
            tran_id: tran_id.clone(),
            amount: total_amount,
            status: PaymentStatus::Pending,
            session_key: None,
            raw_payload: None,
            created_at: now,
            updated_at: now,
        };
        self.payment_repo.create_with_tx(&mut tx, &payment).await?;

        let mut placed = order;
        if request.payment_method == PaymentMethod::Cod {
            // Cash on delivery: paid immediately, no external call
            self.payment_repo.mark_paid_with_tx(&mut tx, &payment.id).await?;
            self.order_repo
                .update_statuses_with_tx(
                    &mut tx,
                    &order_id,
                    PaymentStatus::Paid,
                    OrderStatus::Confirmed,
                )
                .await?;
            placed.payment_status = PaymentStatus::Paid;
            placed.status = OrderStatus::Confirmed;
        }

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            order_id = %order_id,
            order_number = %placed.order_number,
            user_id = %user.id,
            total = %total_amount,
            method = %placed.payment_method,
            "Order placed"
        );

        let redirect_url = match request.payment_method {
            PaymentMethod::Cod => {
                self.send_order_mail(
                    &user.email,
                    &placed,
                    "Order confirmed",
                    "We have received your order and will deliver it soon. Payment is due on delivery.",
                )
                .await;

                if let Err(e) = self.reports.recompute_for_order_date(placed.created_at).await {
                    tracing::warn!(order_id = %order_id, error = %e, "Report recompute failed");
                }

                None
            }
            PaymentMethod::Gateway => {
                // The order is committed; a gateway failure surfaces to the
                // caller but never unwinds it
                let session = self
                    .gateway
                    .create_session(self.session_request(&placed, user, items.len() as u32))
                    .await?;

                self.payment_repo
                    .set_session_key(&payment.id, &session.session_key)
                    .await?;

                Some(session.redirect_url)
            }
        };

        let view = OrderView {
            order: placed,
            items,
        };

        Ok(PlaceOrderResponse {
            order: view,
            redirect_url,
        })
    }

    pub async fn get_order(&self, user: &CurrentUser, order_id: &str) -> Result<OrderView> {
        let order = self
            .order_repo
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order '{}' not found", order_id)))?;

        if order.user_id != user.id && !user.is_admin() {
            return Err(AppError::forbidden("Order does not belong to you"));
        }

        let items = self.order_repo.items_for_order(&order.id).await?;
        Ok(OrderView { order, items })
    }

    pub async fn list_orders(
        &self,
        user: &CurrentUser,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>> {
        if user.is_admin() {
            self.order_repo.list_all(limit, offset).await
        } else {
            self.order_repo.list_for_user(&user.id, limit, offset).await
        }
    }

    /// Admin fulfillment progression with transition validation
    pub async fn update_status(&self, order_id: &str, next: OrderStatus) -> Result<OrderView> {
        let order = self
            .order_repo
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order '{}' not found", order_id)))?;

        if !order.status.can_transition_to(next) {
            return Err(AppError::validation(format!(
                "Invalid status transition from {} to {}",
                order.status, next
            )));
        }

        self.order_repo.update_fulfillment_status(order_id, next).await?;

        let items = self.order_repo.items_for_order(order_id).await?;
        let mut updated = order;
        updated.status = next;
        Ok(OrderView {
            order: updated,
            items,
        })
    }

    fn session_request(&self, order: &Order, user: &CurrentUser, num_items: u32) -> SessionRequest {
        SessionRequest {
            tran_id: order.tran_id.clone(),
            amount: order.total_amount,
            currency: Currency::BDT,
            success_url: format!("{}/payments/success", self.app.api_base_url),
            fail_url: format!("{}/payments/fail", self.app.api_base_url),
            cancel_url: format!("{}/payments/cancel", self.app.api_base_url),
            customer_name: order.shipping_name.clone(),
            customer_email: user.email.clone(),
            customer_phone: order.shipping_phone.clone(),
            customer_city: order.shipping_city.clone(),
            product_name: format!("Order {}", order.order_number),
            product_category: "pharmacy".to_string(),
            num_items,
        }
    }

    /// Best-effort order email; the order is already committed
    async fn send_order_mail(&self, to: &str, order: &Order, subject: &str, line: &str) {
        let body = format!(
            "Dear {},\n\n{}\n\nOrder number: {}\nTotal: {} BDT\n\nThank you for shopping with MediKart!",
            order.shipping_name, line, order.order_number, order.total_amount
        );

        if let Err(e) = self
            .mailer
            .send(to, &format!("{} - {}", subject, order.order_number), &body)
            .await
        {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to send order email");
        }
    }
}

fn validate_shipping(shipping: &ShippingInfo) -> Result<()> {
    if shipping.name.trim().is_empty() {
        return Err(AppError::validation("Shipping name is required"));
    }
    if shipping.phone.trim().is_empty() {
        return Err(AppError::validation("Shipping phone is required"));
    }
    if shipping.address.trim().is_empty() {
        return Err(AppError::validation("Shipping address is required"));
    }
    if shipping.city.trim().is_empty() {
        return Err(AppError::validation("Shipping city is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_shipping_rejects_blanks() {
        let good = ShippingInfo {
            name: "Customer".to_string(),
            phone: "01700000000".to_string(),
            address: "House 1, Road 2".to_string(),
            city: "Dhaka".to_string(),
        };
        assert!(validate_shipping(&good).is_ok());

        let mut missing_phone = good.clone();
        missing_phone.phone = "  ".to_string();
        assert!(validate_shipping(&missing_phone).is_err());

        let mut missing_address = good;
        missing_address.address = String::new();
        assert!(validate_shipping(&missing_address).is_err());
    }
}
