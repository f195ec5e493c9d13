use anyhow::Result;
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport as _, Message, Tokio1Executor};
use mountainwatch_core::{MailSettings, MessageTransport, OutgoingMessage};

use crate::NotifyError;

/// Plain-text mail over SMTP with implicit TLS.
///
/// The transport connects lazily on the first send and keeps a pooled
/// connection for the rest of the run.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer").finish_non_exhaustive()
    }
}

fn mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse()
        .map_err(|source| NotifyError::Address { address: address.to_owned(), source })
}

impl SmtpMailer {
    /// # Errors
    /// Returns an error if the relay host is not a valid TLS server name.
    pub fn new(settings: &MailSettings) -> Result<Self, NotifyError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?.port(settings.port);
        if let (Some(user), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }
        Ok(Self { transport: builder.build() })
    }

    /// Builds the wire message.
    ///
    /// # Errors
    /// Returns an error if an address does not parse.
    pub fn build_message(message: &OutgoingMessage) -> Result<Message, NotifyError> {
        Ok(Message::builder()
            .from(mailbox(&message.from)?)
            .to(mailbox(&message.to)?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())?)
    }
}

#[async_trait]
impl MessageTransport for SmtpMailer {
    async fn send(&self, message: &OutgoingMessage) -> Result<()> {
        let email = Self::build_message(message)?;
        self.transport.send(email).await.map_err(NotifyError::from)?;
        tracing::debug!(to = %message.to, subject = %message.subject, "Mail sent");
        Ok(())
    }
}
