use std::sync::Mutex;

use tracing::info;

/// A plain-text message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MailError {
    #[error("invalid address {address}: {reason}")]
    Address { address: String, reason: String },
    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// Blocking delivery of one message; callers run it off the async executor.
pub trait Mailer: Send + Sync {
    fn send(&self, from: &str, email: &OutboundEmail) -> Result<(), MailError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, from: &str, email: &OutboundEmail) -> Result<(), MailError> {
        info!(
            from,
            to = %email.to,
            subject = %email.subject,
            "mail delivery disabled, message logged"
        );
        Ok(())
    }
}

/// Keeps sent messages in memory. Recipients listed in `failing` are refused.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    failing: Vec<String>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing(recipients: &[&str]) -> Self {
        Self {
            sent: Mutex::default(),
            failing: recipients.iter().map(|recipient| recipient.to_string()).collect(),
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, _from: &str, email: &OutboundEmail) -> Result<(), MailError> {
        if self.failing.iter().any(|recipient| recipient == &email.to) {
            return Err(MailError::Transport(format!("{} refused", email.to)));
        }
        self.sent
            .lock()
            .map_err(|_| MailError::Transport("outbox lock poisoned".to_string()))?
            .push(email.clone());
        Ok(())
    }
}
