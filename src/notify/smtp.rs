use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;

use super::{NotificationRequest, Notifier};
use crate::config::{NotificationConfig, SmtpCredentials};
use crate::error::{Error, Result};

/// Sends notifications through an SMTP relay with STARTTLS
pub struct SmtpNotifier {
    from: Mailbox,
    host: String,
    timeout: Duration,
    transport: SmtpTransport,
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("from", &self.from.to_string())
            .field("host", &self.host)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl SmtpNotifier {
    /// `timeout` bounds each connection and command round trip
    pub fn new(config: &NotificationConfig, credentials: SmtpCredentials, timeout: Duration) -> Result<Self> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| Error::Notification(format!("invalid from address: {}", e)))?;

        let creds = Credentials::new(credentials.username, credentials.password);
        let transport = SmtpTransport::starttls_relay(&config.smtp_host)
            .map_err(|e| Error::Notification(format!("SMTP relay {}: {}", config.smtp_host, e)))?
            .port(config.smtp_port)
            .credentials(creds)
            .timeout(Some(timeout))
            .build();

        Ok(SmtpNotifier {
            from,
            host: config.smtp_host.clone(),
            timeout,
            transport,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn build_message(&self, request: &NotificationRequest) -> Result<Message> {
        let to: Mailbox = request
            .recipient
            .parse()
            .map_err(|e| Error::Notification(format!("invalid recipient: {}", e)))?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(request.subject.clone())
            .body(request.body.clone())
            .map_err(|e| Error::Notification(e.to_string()))
    }
}

impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "smtp"
    }

    fn send(&self, request: &NotificationRequest) -> Result<()> {
        let message = self.build_message(request)?;
        self.transport
            .send(&message)
            .map_err(|e| Error::Notification(format!("sending via {}: {}", self.host, e)))?;
        log::info!("notification sent to {} via {}", request.recipient, self.host);
        Ok(())
    }
}
