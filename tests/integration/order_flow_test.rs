// End-to-end workflow tests against a real MySQL database.
//
// Run with a disposable database:
//   TEST_DATABASE_URL=mysql://root@localhost/medikart_test \
//     cargo test --test order_flow_test -- --ignored
//
// Each test seeds its own users and products with unique identifiers, so
// the suite can run repeatedly against the same schema.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal_macros::dec;
use sqlx::MySqlPool;
use uuid::Uuid;

use medikart::carts::repositories::CartRepository;
use medikart::carts::services::CartService;
use medikart::catalog::models::{CreateCategoryRequest, CreateProductRequest, ProductUnit};
use medikart::catalog::repositories::{BrandRepository, CategoryRepository, ProductRepository};
use medikart::catalog::services::CatalogService;
use medikart::config::AppConfig;
use medikart::core::{AppError, Currency, Result};
use medikart::middleware::auth::CurrentUser;
use medikart::modules::notifications::services::mailer::RecordingMailer;
use medikart::modules::users::models::{User, UserRole};
use medikart::modules::users::repositories::UserRepository;
use medikart::modules::users::services::auth_service::hash_password;
use medikart::orders::models::{PaymentMethod, PlaceOrderRequest, ShippingInfo};
use medikart::orders::repositories::OrderRepository;
use medikart::orders::services::OrderService;
use medikart::payments::models::{CallbackOutcome, PaymentStatus};
use medikart::payments::repositories::PaymentRepository;
use medikart::payments::services::{
    PaymentGateway, PaymentService, SessionRequest, SessionResponse,
};
use medikart::prescriptions::models::{PrescriptionItemInput, SubmitPrescriptionRequest};
use medikart::prescriptions::repositories::PrescriptionRepository;
use medikart::prescriptions::services::{PrescriptionService, ReviewOutcome};
use medikart::reports::repositories::ReportRepository;
use medikart::reports::services::ReportService;

/// Gateway stand-in: always returns a session without any network call
struct StaticGateway;

#[async_trait]
impl PaymentGateway for StaticGateway {
    async fn create_session(&self, request: SessionRequest) -> Result<SessionResponse> {
        assert_eq!(request.currency, Currency::BDT);
        Ok(SessionResponse {
            session_key: format!("session-{}", request.tran_id),
            redirect_url: format!("https://gateway.test/checkout/{}", request.tran_id),
        })
    }

    fn name(&self) -> &str {
        "static-test-gateway"
    }
}

struct TestHarness {
    pool: MySqlPool,
    mailer: Arc<RecordingMailer>,
    catalog: CatalogService,
    carts: CartService,
    orders: OrderService,
    payments: PaymentService,
    prescriptions: PrescriptionService,
}

async fn harness() -> TestHarness {
    let url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("TEST_DATABASE_URL must point at a MySQL test database");

    let pool = MySqlPool::connect(&url).await.expect("connect test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");

    let mailer = Arc::new(RecordingMailer::new());
    let mailer_dyn: Arc<dyn medikart::modules::notifications::Mailer> = mailer.clone();
    let reports = Arc::new(ReportService::new(ReportRepository::new(pool.clone())));

    let app = AppConfig {
        env: "test".to_string(),
        log_level: "debug".to_string(),
        frontend_base_url: "http://localhost:5173".to_string(),
        api_base_url: "http://localhost:8080".to_string(),
    };

    TestHarness {
        catalog: CatalogService::new(
            ProductRepository::new(pool.clone()),
            BrandRepository::new(pool.clone()),
            CategoryRepository::new(pool.clone()),
        ),
        carts: CartService::new(
            CartRepository::new(pool.clone()),
            ProductRepository::new(pool.clone()),
        ),
        orders: OrderService::new(
            OrderRepository::new(pool.clone()),
            CartRepository::new(pool.clone()),
            ProductRepository::new(pool.clone()),
            PaymentRepository::new(pool.clone()),
            Arc::new(StaticGateway),
            mailer_dyn.clone(),
            reports.clone(),
            app,
        ),
        payments: PaymentService::new(
            PaymentRepository::new(pool.clone()),
            OrderRepository::new(pool.clone()),
            mailer_dyn.clone(),
            reports,
        ),
        prescriptions: PrescriptionService::new(
            PrescriptionRepository::new(pool.clone()),
            CartRepository::new(pool.clone()),
            ProductRepository::new(pool.clone()),
            mailer_dyn,
        ),
        pool,
        mailer,
    }
}

async fn seed_user(pool: &MySqlPool, role: UserRole) -> CurrentUser {
    let id = Uuid::new_v4().to_string();
    let email = format!("user-{}@test.invalid", &id[..8]);
    let now = Utc::now();

    let user = User {
        id: id.clone(),
        full_name: "Test Customer".to_string(),
        email: email.clone(),
        phone: "01700000000".to_string(),
        gender: "Other".to_string(),
        city: "Dhaka".to_string(),
        date_of_birth: None,
        address: Some("House 1, Road 2".to_string()),
        password_hash: hash_password("test-password").unwrap(),
        is_verified: true,
        is_active: true,
        role,
        created_at: now,
        updated_at: now,
    };

    UserRepository::new(pool.clone()).create(&user).await.unwrap();

    CurrentUser {
        id,
        email,
        full_name: user.full_name,
        role,
    }
}

async fn seed_product(
    harness: &TestHarness,
    price: rust_decimal::Decimal,
    stock: u32,
    prescription_required: bool,
) -> medikart::catalog::models::Product {
    let suffix = &Uuid::new_v4().to_string()[..8];

    let category = harness
        .catalog
        .create_category(CreateCategoryRequest {
            name: format!("Category {}", suffix),
            parent_id: None,
            image: None,
            is_active: true,
        })
        .await
        .unwrap();

    harness
        .catalog
        .create_product(CreateProductRequest {
            sku: format!("SKU-{}", suffix),
            name: format!("Product {}", suffix),
            description: None,
            generic_name: None,
            indication: None,
            adult_dose: None,
            child_dose: None,
            contraindication: None,
            precaution: None,
            side_effect: None,
            category_id: category.id,
            brand_id: None,
            price,
            actual_price: price / rust_decimal::Decimal::from(2),
            offer_percentage: rust_decimal::Decimal::ZERO,
            stock,
            unit: ProductUnit::Tablet,
            unit_value: None,
            weight_value: None,
            weight_unit: None,
            prescription_required,
            image1: None,
            image2: None,
            image3: None,
            is_active: true,
        })
        .await
        .unwrap()
}

fn shipping() -> ShippingInfo {
    ShippingInfo {
        name: "Test Customer".to_string(),
        phone: "01700000000".to_string(),
        address: "House 1, Road 2".to_string(),
        city: "Dhaka".to_string(),
    }
}

#[tokio::test]
#[ignore = "requires a MySQL test database"]
async fn test_cod_order_snapshots_cart_and_deducts_stock() {
    let h = harness().await;
    let user = seed_user(&h.pool, UserRole::User).await;

    let product_a = seed_product(&h, dec!(100.00), 10, false).await;
    let product_b = seed_product(&h, dec!(50.00), 5, false).await;

    h.carts.add_item(&user.id, &product_a.id, 2).await.unwrap();
    h.carts.add_item(&user.id, &product_b.id, 1).await.unwrap();

    let placed = h
        .orders
        .place_order(
            &user,
            PlaceOrderRequest {
                shipping: shipping(),
                payment_method: PaymentMethod::Cod,
            },
        )
        .await
        .unwrap();

    assert_eq!(placed.order.order.total_amount, dec!(250.00));
    assert_eq!(placed.order.items.len(), 2);
    assert!(placed.redirect_url.is_none());
    assert_eq!(placed.order.order.payment_status, PaymentStatus::Paid);

    // Source cart is empty and a fresh active cart takes its place
    let cart = h.carts.get_cart(&user.id).await.unwrap();
    assert!(cart.items.is_empty());

    // Stock came off at order time
    let product = h.catalog.get_product(&product_a.id).await.unwrap();
    assert_eq!(product.stock, 8);

    // Exactly one confirmation email
    let confirmations = h
        .mailer
        .sent
        .lock()
        .unwrap()
        .iter()
        .filter(|m| m.subject.contains("Order confirmed"))
        .count();
    assert_eq!(confirmations, 1);
}

#[tokio::test]
#[ignore = "requires a MySQL test database"]
async fn test_insufficient_stock_leaves_no_trace() {
    let h = harness().await;
    let user = seed_user(&h.pool, UserRole::User).await;

    let product = seed_product(&h, dec!(80.00), 1, false).await;
    h.carts.add_item(&user.id, &product.id, 2).await.unwrap();

    let result = h
        .orders
        .place_order(
            &user,
            PlaceOrderRequest {
                shipping: shipping(),
                payment_method: PaymentMethod::Cod,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::InsufficientStock { .. })));

    // No stock mutation, no phantom order, cart untouched
    let unchanged = h.catalog.get_product(&product.id).await.unwrap();
    assert_eq!(unchanged.stock, 1);

    let orders = h.orders.list_orders(&user, 10, 0).await.unwrap();
    assert!(orders.is_empty());

    let cart = h.carts.get_cart(&user.id).await.unwrap();
    assert_eq!(cart.items.len(), 1);
}

#[tokio::test]
#[ignore = "requires a MySQL test database"]
async fn test_gateway_callback_replay_is_noop() {
    let h = harness().await;
    let user = seed_user(&h.pool, UserRole::User).await;

    let product = seed_product(&h, dec!(120.00), 10, false).await;
    h.carts.add_item(&user.id, &product.id, 1).await.unwrap();

    let placed = h
        .orders
        .place_order(
            &user,
            PlaceOrderRequest {
                shipping: shipping(),
                payment_method: PaymentMethod::Gateway,
            },
        )
        .await
        .unwrap();

    assert!(placed.redirect_url.is_some());
    assert_eq!(placed.order.order.payment_status, PaymentStatus::Pending);

    let tran_id = placed.order.order.tran_id.clone();
    let payload = serde_json::json!({ "tran_id": tran_id, "status": "VALID" });

    let first = h
        .payments
        .handle_callback(&tran_id, CallbackOutcome::Success, payload.clone())
        .await
        .unwrap();
    assert!(!first.already_processed);
    assert_eq!(first.payment_status, PaymentStatus::Paid);

    let mails_after_first = h.mailer.sent_count();

    let second = h
        .payments
        .handle_callback(&tran_id, CallbackOutcome::Success, payload)
        .await
        .unwrap();
    assert!(second.already_processed);
    assert_eq!(second.payment_status, PaymentStatus::Paid);

    // Replay sent nothing and did not touch stock again
    assert_eq!(h.mailer.sent_count(), mails_after_first);
    let product_after = h.catalog.get_product(&product.id).await.unwrap();
    assert_eq!(product_after.stock, 9);
}

#[tokio::test]
#[ignore = "requires a MySQL test database"]
async fn test_double_approval_is_idempotent() {
    let h = harness().await;
    let user = seed_user(&h.pool, UserRole::User).await;
    let admin = seed_user(&h.pool, UserRole::Admin).await;

    let product = seed_product(&h, dec!(60.00), 20, true).await;

    let submitted = h
        .prescriptions
        .submit(
            &user.id,
            &user.email,
            SubmitPrescriptionRequest {
                items: vec![PrescriptionItemInput {
                    product_id: product.id.clone(),
                    quantity: 2,
                    note: None,
                }],
                upload: None,
                notes: None,
                auto_add_to_cart: true,
            },
        )
        .await
        .unwrap();

    let (_, first) = h
        .prescriptions
        .approve(&submitted.request.id, &admin.id, None)
        .await
        .unwrap();
    assert_eq!(first, ReviewOutcome::Transitioned);

    let cart_after_first = h.carts.get_cart(&user.id).await.unwrap();
    let mails_after_first = h.mailer.sent_count();

    let (_, second) = h
        .prescriptions
        .approve(&submitted.request.id, &admin.id, None)
        .await
        .unwrap();
    assert_eq!(second, ReviewOutcome::AlreadyTerminal);

    // Same cart state, no extra email
    let cart_after_second = h.carts.get_cart(&user.id).await.unwrap();
    assert_eq!(cart_after_first.items.len(), cart_after_second.items.len());
    assert_eq!(
        cart_after_first.items[0].quantity,
        cart_after_second.items[0].quantity
    );
    assert_eq!(h.mailer.sent_count(), mails_after_first);
}
