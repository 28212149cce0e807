pub mod payment;

pub use payment::{CallbackOutcome, Payment, PaymentStatus};
