use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::Mailbox,
    transport::smtp::authentication::Credentials,
};
use tracing::{error, warn};

use crate::config::MailSettings;

/// Outbound notification channel for inquiry/feedback submissions.
///
/// Fire-and-forget: delivery failures are logged and never surfaced to the
/// client, since the record is already persisted by the time mail is sent.
#[derive(Clone)]
pub struct Notifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    to: String,
}

impl Notifier {
    /// Build the notifier from SMTP settings, or return None (with a warning)
    /// when the relay rejects the configuration.
    pub fn from_settings(settings: &MailSettings) -> Option<Self> {
        let credentials =
            Credentials::new(settings.username.clone(), settings.password.clone());

        let mailer = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host) {
            Ok(builder) => builder.credentials(credentials).build(),
            Err(err) => {
                warn!(?err, host = %settings.host, "invalid SMTP relay, notifications disabled");
                return None;
            }
        };

        Some(Self {
            mailer,
            from: settings.username.clone(),
            to: settings.notify_address.clone(),
        })
    }

    pub async fn notify(&self, subject: &str, body: String) {
        let from: Mailbox = match self.from.parse() {
            Ok(mailbox) => mailbox,
            Err(err) => {
                error!(?err, "invalid notification sender address");
                return;
            }
        };
        let to: Mailbox = match self.to.parse() {
            Ok(mailbox) => mailbox,
            Err(err) => {
                error!(?err, "invalid notification recipient address");
                return;
            }
        };

        let message = match Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .body(body)
        {
            Ok(message) => message,
            Err(err) => {
                error!(?err, "failed to build notification message");
                return;
            }
        };

        if let Err(err) = self.mailer.send(message).await {
            error!(?err, subject, "failed to send notification email");
        }
    }
}
