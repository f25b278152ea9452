//! Best-effort email notifications for scheduled jobs.
//!
//! # Data Flow
//! ```text
//! job handler
//!     → cron.rs (format message, pick recipient)
//!     → spawned task
//!     → mailer.rs (MailTransport: SMTP)
//! ```
//!
//! # Design Decisions
//! - Missing recipient or transport is a warning, not an error
//! - Delivery runs off the job's path; failures are logged and dropped

pub mod cron;
pub mod mailer;

pub use cron::{format_message, CronNotifier, JobEvent};
pub use mailer::{Mail, MailTransport, NotifyError, SmtpMailer};
