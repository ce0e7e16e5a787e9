//! Verdict notifications

mod smtp;

use serde::Serialize;
use std::time::Duration;

use crate::compare::ComparisonVerdict;
use crate::config::{NotificationConfig, SmtpCredentials};
use crate::error::{Error, Result};

pub use self::smtp::SmtpNotifier;

/// A message ready to dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationRequest {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl NotificationRequest {
    /// Build the message announcing a verdict
    ///
    /// `kind` is the noun used for the selections, e.g. "stock".
    pub fn from_verdict(recipient: &str, verdict: &ComparisonVerdict, kind: &str) -> Result<Self> {
        let recipient = recipient.trim();
        if recipient.is_empty() || !recipient.contains('@') {
            return Err(Error::Notification(format!(
                "invalid recipient address '{}'",
                recipient
            )));
        }
        Ok(NotificationRequest {
            recipient: recipient.to_string(),
            subject: format!("{} Forecast Notification", capitalize(kind)),
            body: verdict.message(kind),
        })
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Delivers notification requests
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Transport name for reports
    fn name(&self) -> &str;

    /// Deliver one request
    fn send(&self, request: &NotificationRequest) -> Result<()>;
}

/// Writes requests to the log instead of sending them
#[derive(Debug)]
pub struct LogNotifier {
    prefix: String,
}

impl LogNotifier {
    pub fn new(prefix: impl Into<String>) -> Self {
        LogNotifier {
            prefix: prefix.into(),
        }
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new("notify")
    }
}

impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn send(&self, request: &NotificationRequest) -> Result<()> {
        log::info!(
            "{} to={} subject=\"{}\" body=\"{}\"",
            self.prefix,
            request.recipient,
            request.subject,
            request.body
        );
        Ok(())
    }
}

/// Notifier for a configuration: log-only for dry runs, SMTP otherwise
///
/// SMTP credentials are read from the environment here.
pub fn notifier_from_config(config: &NotificationConfig, timeout: Duration) -> Result<Box<dyn Notifier>> {
    if config.dry_run {
        return Ok(Box::new(LogNotifier::default()));
    }
    let credentials = SmtpCredentials::from_env()
        .map_err(|e| Error::Notification(e.to_string()))?;
    Ok(Box::new(SmtpNotifier::new(config, credentials, timeout)?))
}
