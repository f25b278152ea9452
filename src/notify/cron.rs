//! Start/completion/failure notifications for scheduled jobs.

use std::error::Error;
use std::fmt::Write;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::notify::mailer::{Mail, MailTransport, SmtpMailer};
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobEvent {
    Started,
    Completed,
    Failed,
}

impl JobEvent {
    fn subject_prefix(self) -> &'static str {
        match self {
            JobEvent::Started => "🚀 Cron Started:",
            JobEvent::Completed => "✅ Cron Completed:",
            JobEvent::Failed => "❌ Cron Failed:",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            JobEvent::Started => "started",
            JobEvent::Completed => "completed",
            JobEvent::Failed => "failed",
        }
    }
}

/// Render the plain-text body of a job notification.
pub fn format_message(
    event: JobEvent,
    job: &str,
    error: Option<&(dyn Error + 'static)>,
    details: &[(&str, String)],
    timestamp: DateTime<Utc>,
    environment: &str,
) -> String {
    let mut text = format!("Cron job {}: {job}\n\n", event.verb());

    // Writing into a String cannot fail.
    if let Some(error) = error {
        let _ = writeln!(text, "Error: {error}");
        let mut source = error.source();
        while let Some(cause) = source {
            let _ = writeln!(text, "Caused by: {cause}");
            source = cause.source();
        }
        text.push('\n');
    }

    text.push_str("Details:\n");
    if details.is_empty() {
        text.push_str("No additional details\n");
    }
    for (key, value) in details {
        let _ = writeln!(text, "{key}: {value}");
    }

    let _ = write!(
        text,
        "\nTimestamp: {}\nEnvironment: {environment}",
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    );
    text
}

/// Sends job notifications to a single configured recipient.
#[derive(Clone)]
pub struct CronNotifier {
    transport: Option<Arc<dyn MailTransport>>,
    recipient: Option<String>,
    environment: String,
}

impl CronNotifier {
    pub fn new(
        transport: Option<Arc<dyn MailTransport>>,
        recipient: Option<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            recipient,
            environment: environment.into(),
        }
    }

    /// SMTP transport is only built when a recipient is configured.
    pub fn from_config(config: &AppConfig) -> Self {
        let transport = match &config.cron.notification_email {
            Some(_) => match SmtpMailer::from_config(&config.smtp) {
                Ok(mailer) => Some(Arc::new(mailer) as Arc<dyn MailTransport>),
                Err(e) => {
                    tracing::warn!(error = %e, "SMTP transport unavailable, job notifications disabled");
                    None
                }
            },
            None => None,
        };

        Self::new(
            transport,
            config.cron.notification_email.clone(),
            config.environment.clone(),
        )
    }

    pub fn notify_start(&self, job: &str, details: &[(&str, String)]) -> Option<JoinHandle<bool>> {
        self.notify(JobEvent::Started, job, None, details)
    }

    pub fn notify_end(&self, job: &str, details: &[(&str, String)]) -> Option<JoinHandle<bool>> {
        self.notify(JobEvent::Completed, job, None, details)
    }

    pub fn notify_error(
        &self,
        job: &str,
        error: &(dyn Error + 'static),
        details: &[(&str, String)],
    ) -> Option<JoinHandle<bool>> {
        self.notify(JobEvent::Failed, job, Some(error), details)
    }

    /// Spawn delivery. `None` when skipped; the handle resolves to whether
    /// the message was accepted by the transport.
    fn notify(
        &self,
        event: JobEvent,
        job: &str,
        error: Option<&(dyn Error + 'static)>,
        details: &[(&str, String)],
    ) -> Option<JoinHandle<bool>> {
        let Some(recipient) = self.recipient.clone() else {
            tracing::warn!(job, "Cron notification recipient not set, skipping notification");
            metrics::record_notification("skipped");
            return None;
        };
        let Some(transport) = self.transport.clone() else {
            tracing::warn!(job, "Mail transport not configured, skipping notification");
            metrics::record_notification("skipped");
            return None;
        };

        let mail = Mail {
            to: recipient,
            subject: format!("{} {job}", event.subject_prefix()),
            text: format_message(event, job, error, details, Utc::now(), &self.environment),
        };

        Some(tokio::spawn(async move {
            let subject = mail.subject.clone();
            tracing::info!(to = %mail.to, subject = %subject, "Sending job notification");

            match transport.send(mail).await {
                Ok(()) => {
                    tracing::info!(subject = %subject, "Job notification sent");
                    metrics::record_notification("sent");
                    true
                }
                Err(e) => {
                    tracing::error!(subject = %subject, error = %e, "Failed to send job notification");
                    metrics::record_notification("failed");
                    false
                }
            }
        }))
    }
}
