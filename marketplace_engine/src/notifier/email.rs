use std::future::Future;

use log::*;
use regex::Regex;
use thiserror::Error;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$";

#[derive(Debug, Clone, Error)]
pub enum EmailError {
    #[error("Invalid email address: '{0}'")]
    InvalidAddress(String),
    #[error("Email sink is misconfigured: {0}")]
    Configuration(String),
    #[error("Could not deliver email: {0}")]
    DeliveryFailed(String),
}

impl From<regex::Error> for EmailError {
    fn from(e: regex::Error) -> Self {
        Self::Configuration(e.to_string())
    }
}

/// Somewhere to send plain subject/body emails.
///
/// Rendering is the caller's job; implementations only deliver. The returned future must be `Send`, since emails are
/// sent from inside event-handler tasks.
pub trait EmailSender: Clone + Send + Sync + 'static {
    fn send(&self, to: &str, subject: &str, html_body: &str) -> impl Future<Output = Result<(), EmailError>> + Send;
}

/// The default email sink. It checks the recipient address and then writes the message to the log.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
    enabled: bool,
    address_pattern: Regex,
}

impl LogMailer {
    pub fn new<S: Into<String>>(from: S, enabled: bool) -> Result<Self, EmailError> {
        let address_pattern = Regex::new(EMAIL_PATTERN)?;
        Ok(Self { from: from.into(), enabled, address_pattern })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_valid_address(&self, address: &str) -> bool {
        self.address_pattern.is_match(address.trim())
    }
}

impl EmailSender for LogMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), EmailError> {
        if !self.enabled {
            debug!("📧️ Email is disabled. Not sending '{subject}' to {to}");
            return Ok(());
        }
        if !self.is_valid_address(to) {
            return Err(EmailError::InvalidAddress(to.to_string()));
        }
        info!("📧️ Email from {} to {to}: {subject}", self.from);
        trace!("📧️ {html_body}");
        Ok(())
    }
}
