// SMTP delivery for generated documents (STARTTLS, usually port 587).

use crate::core::documents::{Mailer, OutgoingEmail, WorkspaceError};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub email: String,
    pub password: String,
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, WorkspaceError> {
        let from: Mailbox = settings
            .email
            .parse()
            .map_err(|e| WorkspaceError::Mail(format!("invalid sender address: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)
            .map_err(|e| WorkspaceError::Mail(e.to_string()))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.email.clone(),
                settings.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }
}

/// Builds the MIME message: HTML body followed by every attachment.
pub fn build_message(from: &Mailbox, email: &OutgoingEmail) -> Result<Message, WorkspaceError> {
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|e| WorkspaceError::Mail(format!("invalid recipient {}: {}", email.to, e)))?;

    let mut body = MultiPart::mixed().singlepart(SinglePart::html(email.html_body.clone()));
    for attachment in &email.attachments {
        let content_type = ContentType::parse(&attachment.mime_type)
            .map_err(|e| WorkspaceError::Mail(e.to_string()))?;
        body = body.singlepart(
            Attachment::new(attachment.filename.clone())
                .body(attachment.content.clone(), content_type),
        );
    }

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(email.subject.clone())
        .multipart(body)
        .map_err(|e| WorkspaceError::Mail(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_email(&self, email: OutgoingEmail) -> Result<(), WorkspaceError> {
        let message = build_message(&self.from, &email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| WorkspaceError::Mail(e.to_string()))?;

        tracing::info!(
            "Sent e-mail '{}' to {} with {} attachment(s)",
            email.subject,
            email.to,
            email.attachments.len()
        );
        Ok(())
    }
}
