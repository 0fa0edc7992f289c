use interview_hub::config::{AppConfig, MailConfig};
use interview_hub::error::AppError;
use interview_hub::jobs::{LogMailer, MailError, Mailer, OutboundEmail};
use interview_hub::store::Store;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Delivers mail through an SMTP relay.
pub(crate) struct SmtpMailer {
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub(crate) fn connect(host: &str, config: &MailConfig) -> Result<Self, MailError> {
        let mut builder =
            SmtpTransport::relay(host).map_err(|err| MailError::Transport(err.to_string()))?;
        if let (Some(user), Some(password)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }
        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|err: lettre::address::AddressError| MailError::Address {
        address: address.to_string(),
        reason: err.to_string(),
    })
}

impl Mailer for SmtpMailer {
    fn send(&self, from: &str, email: &OutboundEmail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(mailbox(from)?)
            .to(mailbox(&email.to)?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|err| MailError::Transport(err.to_string()))?;

        self.transport
            .send(&message)
            .map(|_| ())
            .map_err(|err| MailError::Transport(err.to_string()))
    }
}

/// SMTP when a relay host is configured, otherwise messages are only logged.
pub(crate) fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, AppError> {
    match config.smtp_host.as_deref() {
        Some(host) => {
            info!(%host, "delivering mail through SMTP relay");
            Ok(Arc::new(SmtpMailer::connect(host, config)?))
        }
        None => {
            warn!("APP_SMTP_HOST not set, outgoing mail is logged instead of sent");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Opens the configured snapshot, or an empty store when none is configured.
pub(crate) fn open_store(config: &AppConfig) -> Result<Store, AppError> {
    match &config.storage.data_file {
        Some(path) => Ok(Store::load_snapshot(path)?),
        None => {
            warn!("APP_DATA_FILE not set, data lives only for the lifetime of this process");
            Ok(Store::new())
        }
    }
}

/// Writes the store back to the configured snapshot, if any.
pub(crate) fn persist_store(config: &AppConfig, store: &Store) -> Result<(), AppError> {
    if let Some(path) = &config.storage.data_file {
        store.save_snapshot(path)?;
    }
    Ok(())
}
