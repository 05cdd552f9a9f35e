// In-memory fakes for every port, shared by the unit tests.

use crate::core::ai::models::{AiConfig, AiMessage, AiProviderResponse};
use crate::core::ai::AiProvider;
use crate::core::documents::{
    ChatNotifier, DocumentStore, Mailer, OutgoingEmail, SpreadsheetReader, WorkspaceError,
};
use crate::core::forms::Card;
use crate::core::tasks::{BackgroundTask, TaskSpawner};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ============================================================================
// AI
// ============================================================================

#[derive(Default)]
struct ScriptedAiState {
    calls: Vec<(Vec<AiMessage>, String)>,
}

/// Returns a fixed reply (or always fails) and records every call.
#[derive(Clone)]
pub struct ScriptedAi {
    reply: Option<String>,
    state: Arc<Mutex<ScriptedAiState>>,
}

impl ScriptedAi {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            state: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            state: Arc::default(),
        }
    }

    /// Messages and model name of every call, oldest first.
    pub fn calls(&self) -> Vec<(Vec<AiMessage>, String)> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl AiProvider for ScriptedAi {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push((messages.to_vec(), config.model.clone()));
        match &self.reply {
            Some(content) => Ok(AiProviderResponse {
                content: content.clone(),
                thinking: None,
            }),
            None => Err("scripted failure".into()),
        }
    }
}

// ============================================================================
// DOCUMENTS
// ============================================================================

#[derive(Default)]
struct DocumentLog {
    copies: Vec<(String, String, String)>,
    fills: Vec<(String, BTreeMap<String, String>)>,
    shares: Vec<(String, String)>,
    exports: Vec<(String, String)>,
}

/// Hands out ids `doc-1`, `doc-2`, ... and records every call.
#[derive(Clone, Default)]
pub struct FakeDocumentStore {
    fail_copy: bool,
    fail_export_of: Option<String>,
    log: Arc<Mutex<DocumentLog>>,
}

impl FakeDocumentStore {
    pub fn failing_copy() -> Self {
        Self {
            fail_copy: true,
            ..Self::default()
        }
    }

    /// Exports of `file_id` fail; everything else works.
    pub fn failing_export(file_id: &str) -> Self {
        Self {
            fail_export_of: Some(file_id.to_string()),
            ..Self::default()
        }
    }

    /// (template, title, folder) per copy.
    pub fn copies(&self) -> Vec<(String, String, String)> {
        self.log.lock().unwrap().copies.clone()
    }

    pub fn fills(&self) -> Vec<(String, BTreeMap<String, String>)> {
        self.log.lock().unwrap().fills.clone()
    }

    pub fn shares(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().shares.clone()
    }

    pub fn exports(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().exports.clone()
    }
}

#[async_trait]
impl DocumentStore for FakeDocumentStore {
    async fn copy_template(
        &self,
        template_id: &str,
        title: &str,
        folder_id: &str,
    ) -> Result<String, WorkspaceError> {
        if self.fail_copy {
            return Err(WorkspaceError::Api {
                service: "Drive",
                status: 404,
                body: "template not found".to_string(),
            });
        }
        let mut log = self.log.lock().unwrap();
        log.copies
            .push((template_id.to_string(), title.to_string(), folder_id.to_string()));
        Ok(format!("doc-{}", log.copies.len()))
    }

    async fn fill_placeholders(
        &self,
        document_id: &str,
        replacements: &BTreeMap<String, String>,
    ) -> Result<(), WorkspaceError> {
        self.log
            .lock()
            .unwrap()
            .fills
            .push((document_id.to_string(), replacements.clone()));
        Ok(())
    }

    async fn share_document(&self, document_id: &str, email: &str) -> Result<(), WorkspaceError> {
        self.log
            .lock()
            .unwrap()
            .shares
            .push((document_id.to_string(), email.to_string()));
        Ok(())
    }

    async fn export_document(
        &self,
        document_id: &str,
        mime_type: &str,
    ) -> Result<Vec<u8>, WorkspaceError> {
        self.log
            .lock()
            .unwrap()
            .exports
            .push((document_id.to_string(), mime_type.to_string()));
        if self.fail_export_of.as_deref() == Some(document_id) {
            return Err(WorkspaceError::Api {
                service: "Drive",
                status: 500,
                body: "export failed".to_string(),
            });
        }
        Ok(format!("{}:{}", document_id, mime_type).into_bytes())
    }
}

#[derive(Clone, Default)]
pub struct RecordingMailer {
    fail: bool,
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl RecordingMailer {
    /// Records the e-mail, then reports an SMTP failure.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_email(&self, email: OutgoingEmail) -> Result<(), WorkspaceError> {
        self.sent.lock().unwrap().push(email);
        if self.fail {
            return Err(WorkspaceError::Mail("relay refused".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ChatPost {
    pub space: String,
    pub thread: Option<String>,
    pub text: String,
    pub card: Option<Card>,
}

#[derive(Clone, Default)]
pub struct RecordingChat {
    posts: Arc<Mutex<Vec<ChatPost>>>,
}

impl RecordingChat {
    pub fn posts(&self) -> Vec<ChatPost> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatNotifier for RecordingChat {
    async fn post_message(
        &self,
        space: &str,
        thread: Option<&str>,
        text: &str,
        card: Option<&Card>,
    ) -> Result<(), WorkspaceError> {
        self.posts.lock().unwrap().push(ChatPost {
            space: space.to_string(),
            thread: thread.map(str::to_string),
            text: text.to_string(),
            card: card.cloned(),
        });
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FakeSheet {
    rows: Vec<Vec<String>>,
    fail: bool,
}

impl FakeSheet {
    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows, fail: false }
    }

    pub fn failing() -> Self {
        Self {
            rows: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl SpreadsheetReader for FakeSheet {
    async fn read_range(
        &self,
        _sheet_id: &str,
        _range: &str,
    ) -> Result<Vec<Vec<String>>, WorkspaceError> {
        if self.fail {
            return Err(WorkspaceError::Network("sheet unreachable".to_string()));
        }
        Ok(self.rows.clone())
    }
}

// ============================================================================
// TASKS
// ============================================================================

/// Collects spawned tasks so a test decides when background work happens.
#[derive(Clone, Default)]
pub struct RecordingSpawner {
    tasks: Arc<Mutex<Vec<(&'static str, BackgroundTask)>>>,
}

impl RecordingSpawner {
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// Runs queued tasks in spawn order until none are left.
    pub async fn run_all(&self) {
        loop {
            let batch: Vec<_> = std::mem::take(&mut *self.tasks.lock().unwrap());
            if batch.is_empty() {
                return;
            }
            for (_, task) in batch {
                task.await;
            }
        }
    }
}

impl TaskSpawner for RecordingSpawner {
    fn spawn(&self, name: &'static str, task: BackgroundTask) {
        self.tasks.lock().unwrap().push((name, task));
    }
}
