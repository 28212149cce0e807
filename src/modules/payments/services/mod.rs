pub mod gateway_trait;
pub mod payment_service;
pub mod sslcommerz;

pub use gateway_trait::{PaymentGateway, SessionRequest, SessionResponse};
pub use payment_service::{CallbackResult, PaymentService};
pub use sslcommerz::SslCommerzClient;
