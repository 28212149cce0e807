use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medikart::config::Config;
use medikart::middleware::{BearerAuth, RequestIdHeader};
use medikart::modules::carts::controllers::cart_controller;
use medikart::modules::carts::repositories::CartRepository;
use medikart::modules::carts::services::CartService;
use medikart::modules::catalog::controllers::catalog_controller;
use medikart::modules::catalog::repositories::{
    BrandRepository, CategoryRepository, ProductRepository,
};
use medikart::modules::catalog::services::CatalogService;
use medikart::modules::notifications::{HttpMailer, Mailer};
use medikart::modules::orders::controllers::order_controller;
use medikart::modules::orders::repositories::OrderRepository;
use medikart::modules::orders::services::OrderService;
use medikart::modules::payments::controllers::webhook_controller;
use medikart::modules::payments::repositories::PaymentRepository;
use medikart::modules::payments::services::{PaymentGateway, PaymentService, SslCommerzClient};
use medikart::modules::prescriptions::controllers::prescription_controller;
use medikart::modules::prescriptions::repositories::PrescriptionRepository;
use medikart::modules::prescriptions::services::PrescriptionService;
use medikart::modules::reports::controllers::report_controller;
use medikart::modules::reports::repositories::ReportRepository;
use medikart::modules::reports::services::ReportService;
use medikart::modules::users::controllers::auth_controller;
use medikart::modules::users::repositories::{TokenRepository, UserRepository};
use medikart::modules::users::services::AuthService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medikart=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Configuration validation failed");

    tracing::info!("Starting MediKart Pharmacy Commerce Backend");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .expect("Failed to create database pool");

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    // External boundaries
    let mailer: Arc<dyn Mailer> =
        Arc::new(HttpMailer::new(config.mail.clone()).expect("Failed to build mailer"));
    let gateway: Arc<dyn PaymentGateway> = Arc::new(
        SslCommerzClient::new(config.gateway.clone()).expect("Failed to build gateway client"),
    );

    // Services
    let catalog_service = Arc::new(CatalogService::new(
        ProductRepository::new(db_pool.clone()),
        BrandRepository::new(db_pool.clone()),
        CategoryRepository::new(db_pool.clone()),
    ));
    let auth_service = Arc::new(AuthService::new(
        UserRepository::new(db_pool.clone()),
        TokenRepository::new(db_pool.clone()),
        mailer.clone(),
        config.security.clone(),
    ));
    let cart_service = Arc::new(CartService::new(
        CartRepository::new(db_pool.clone()),
        ProductRepository::new(db_pool.clone()),
    ));
    let prescription_service = Arc::new(PrescriptionService::new(
        PrescriptionRepository::new(db_pool.clone()),
        CartRepository::new(db_pool.clone()),
        ProductRepository::new(db_pool.clone()),
        mailer.clone(),
    ));
    let report_service = Arc::new(ReportService::new(ReportRepository::new(db_pool.clone())));
    let order_service = Arc::new(OrderService::new(
        OrderRepository::new(db_pool.clone()),
        CartRepository::new(db_pool.clone()),
        ProductRepository::new(db_pool.clone()),
        PaymentRepository::new(db_pool.clone()),
        gateway.clone(),
        mailer.clone(),
        report_service.clone(),
        config.app.clone(),
    ));
    let payment_service = Arc::new(PaymentService::new(
        PaymentRepository::new(db_pool.clone()),
        OrderRepository::new(db_pool.clone()),
        mailer.clone(),
        report_service.clone(),
    ));

    let bind_address = config.server.bind_address();
    let frontend_origin = config.app.frontend_base_url.clone();
    let otp_rate_limit = config.security.otp_requests_per_minute;

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(["GET", "POST", "PATCH", "DELETE"])
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(BearerAuth::new(db_pool.clone()))
            .wrap(cors)
            .wrap(RequestIdHeader)
            .app_data(web::Data::new(catalog_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(cart_service.clone()))
            .app_data(web::Data::new(prescription_service.clone()))
            .app_data(web::Data::new(report_service.clone()))
            .app_data(web::Data::new(order_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .route("/health", web::get().to(health_check))
            .route("/", web::get().to(index))
            .configure(auth_controller::configure(otp_rate_limit))
            .configure(catalog_controller::configure)
            .configure(cart_controller::configure)
            .configure(prescription_controller::configure)
            .configure(order_controller::configure)
            .configure(webhook_controller::configure)
            .configure(report_controller::configure)
    })
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "medikart"
    }))
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "MediKart Pharmacy Commerce Backend",
        "version": "0.1.0",
        "status": "running"
    }))
}
