pub mod services;

pub use services::{HttpMailer, Mailer};
