// Capabilities the form engine needs from the outside world. The infra layer
// implements them against Google Workspace, SMTP and the Chat REST API; tests
// substitute in-memory fakes.

use crate::core::forms::Card;
use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("{service} request failed ({status}): {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("E-mail delivery failed: {0}")]
    Mail(String),
}

// ============================================================================
// MODELS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct EmailAttachment {
    pub filename: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<EmailAttachment>,
}

// ============================================================================
// PORTS
// ============================================================================

/// Template-based documents in cloud storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Copies `template_id` into `folder_id` under `title`, returning the new id.
    async fn copy_template(
        &self,
        template_id: &str,
        title: &str,
        folder_id: &str,
    ) -> Result<String, WorkspaceError>;

    /// Replaces every occurrence of each key (literal text) with its value.
    async fn fill_placeholders(
        &self,
        document_id: &str,
        replacements: &BTreeMap<String, String>,
    ) -> Result<(), WorkspaceError>;

    /// Grants `email` write access to the document.
    async fn share_document(&self, document_id: &str, email: &str) -> Result<(), WorkspaceError>;

    async fn export_document(
        &self,
        document_id: &str,
        mime_type: &str,
    ) -> Result<Vec<u8>, WorkspaceError>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, email: OutgoingEmail) -> Result<(), WorkspaceError>;
}

/// Posts messages into a chat space outside of a request/response cycle.
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    async fn post_message(
        &self,
        space: &str,
        thread: Option<&str>,
        text: &str,
        card: Option<&Card>,
    ) -> Result<(), WorkspaceError>;
}

#[async_trait]
pub trait SpreadsheetReader: Send + Sync {
    /// Rows of the range; short rows are not padded.
    async fn read_range(
        &self,
        sheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, WorkspaceError>;
}
