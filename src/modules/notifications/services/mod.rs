pub mod mailer;

pub use mailer::{HttpMailer, Mailer, RecordingMailer};
