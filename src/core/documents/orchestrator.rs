// Final step of every form: copy the template, fill it, share it, tell the user.
//
// The orchestrator never returns an error to whoever started it. It runs on a
// background task, so the only way a failure can reach the user is the chat
// notification sent from `run`.

use super::ports::{
    ChatNotifier, DocumentStore, EmailAttachment, Mailer, OutgoingEmail, WorkspaceError,
};
use crate::core::forms::{FormVariant, Requester};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const PRESENTATION_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const PDF_MIME: &str = "application/pdf";
const EMAIL_SENT_NOTICE: &str = "📧 The documents have also been sent to your e-mail.";

/// Where one variant's documents come from and go to.
#[derive(Debug, Clone)]
pub struct VariantTargets {
    pub template_id: String,
    pub folder_id: String,
    /// Companion file shared (and e-mailed) alongside the presentation.
    pub checklist_id: Option<String>,
    /// Whether the finished documents are also sent by e-mail.
    pub email_documents: bool,
}

#[derive(Debug, Clone)]
pub struct DocumentTargets {
    pub form_a: VariantTargets,
    pub subtype_a: VariantTargets,
    pub subtype_b: VariantTargets,
}

impl DocumentTargets {
    pub fn for_variant(&self, variant: FormVariant) -> &VariantTargets {
        match variant {
            FormVariant::FormA => &self.form_a,
            FormVariant::SubtypeA => &self.subtype_a,
            FormVariant::SubtypeB => &self.subtype_b,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDocument {
    pub id: String,
    pub url: String,
}

/// Everything needed to produce and deliver one document.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub variant: FormVariant,
    /// Name of the new file; also used in chat and e-mail wording.
    pub title: String,
    /// Placeholder key (without braces) to replacement value.
    pub values: BTreeMap<String, String>,
    pub requester: Requester,
    pub space: Option<String>,
    pub thread: Option<String>,
}

pub fn presentation_url(document_id: &str) -> String {
    format!("https://docs.google.com/presentation/d/{}/edit", document_id)
}

pub fn file_view_url(file_id: &str) -> String {
    format!("https://docs.google.com/file/d/{}/view", file_id)
}

/// Wraps every key in `{{...}}`. Values are inserted verbatim.
pub fn placeholder_map(values: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    values
        .iter()
        .map(|(key, value)| (format!("{{{{{}}}}}", key), value.clone()))
        .collect()
}

pub struct DocumentGenerationOrchestrator {
    documents: Arc<dyn DocumentStore>,
    mailer: Option<Arc<dyn Mailer>>,
    chat: Arc<dyn ChatNotifier>,
    targets: DocumentTargets,
}

impl DocumentGenerationOrchestrator {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        mailer: Option<Arc<dyn Mailer>>,
        chat: Arc<dyn ChatNotifier>,
        targets: DocumentTargets,
    ) -> Self {
        Self {
            documents,
            mailer,
            chat,
            targets,
        }
    }

    /// Copies the variant's template and fills every placeholder.
    pub async fn generate(
        &self,
        variant: FormVariant,
        title: &str,
        values: &BTreeMap<String, String>,
    ) -> Result<GeneratedDocument, WorkspaceError> {
        let targets = self.targets.for_variant(variant);
        let id = self
            .documents
            .copy_template(&targets.template_id, title, &targets.folder_id)
            .await?;
        info!(variant = variant.key(), document_id = %id, "Template copied");

        self.documents
            .fill_placeholders(&id, &placeholder_map(values))
            .await?;

        Ok(GeneratedDocument {
            url: presentation_url(&id),
            id,
        })
    }

    /// Shares with `email`; a blank address is skipped.
    pub async fn share(&self, document_id: &str, email: &str) -> Result<(), WorkspaceError> {
        if email.is_empty() {
            warn!(document_id, "No requester e-mail, skipping share");
            return Ok(());
        }
        self.documents.share_document(document_id, email).await
    }

    /// Exports the presentation (and checklist) and mails them to the requester.
    /// Attachments that fail to export are left out rather than failing the mail.
    ///
    /// Returns whether a message actually went out: no mailer or a blank
    /// recipient address means nothing was sent.
    pub async fn email_documents(
        &self,
        document: &GeneratedDocument,
        checklist_id: Option<&str>,
        recipient: &Requester,
        title: &str,
    ) -> Result<bool, WorkspaceError> {
        let Some(mailer) = &self.mailer else {
            warn!("E-mail delivery is not configured, skipping attachments");
            return Ok(false);
        };
        if recipient.email.is_empty() {
            warn!(document_id = %document.id, "No requester e-mail, skipping attachments");
            return Ok(false);
        }

        let mut exports = vec![(
            document.id.as_str(),
            PRESENTATION_MIME,
            format!("{}.pptx", title),
        )];
        if let Some(checklist) = checklist_id {
            exports.push((checklist, PDF_MIME, "Checklist.pdf".to_string()));
        }

        let mut attachments = Vec::new();
        for (file_id, mime_type, filename) in exports {
            match self.documents.export_document(file_id, mime_type).await {
                Ok(content) => attachments.push(EmailAttachment {
                    filename,
                    mime_type: mime_type.to_string(),
                    content,
                }),
                Err(e) => error!(file_id, "Failed to export attachment: {}", e),
            }
        }

        mailer
            .send_email(OutgoingEmail {
                to: recipient.email.clone(),
                subject: format!("Your generated documents for {}", title),
                html_body: format!(
                    "Hello {},<br><br>Please find your documents attached.",
                    recipient.display_name
                ),
                attachments,
            })
            .await?;
        Ok(true)
    }

    /// Runs the whole chain once. Failures are logged and reported in chat.
    pub async fn run(&self, request: SubmissionRequest) {
        info!(
            variant = request.variant.key(),
            title = %request.title,
            "Starting document generation"
        );

        match self.deliver(&request).await {
            Ok(Some(message)) => self.notify(&request, &message).await,
            Ok(None) => {}
            Err(e) => {
                error!(
                    variant = request.variant.key(),
                    "Document generation failed: {}", e
                );
                self.notify(&request, &format!("A critical error occurred: {}", e))
                    .await;
            }
        }
    }

    /// The final chat message, or `None` when everything was already posted.
    async fn deliver(
        &self,
        request: &SubmissionRequest,
    ) -> Result<Option<String>, WorkspaceError> {
        let targets = self.targets.for_variant(request.variant);
        let document = self
            .generate(request.variant, &request.title, &request.values)
            .await?;
        self.share(&document.id, &request.requester.email).await?;

        let Some(checklist_id) = targets.checklist_id.as_deref() else {
            return Ok(Some(format!(
                "Done! The document for **{}** has been generated.\n\nEdit here: {}",
                request.title, document.url
            )));
        };

        self.share(checklist_id, &request.requester.email).await?;
        let message = format!(
            "🎉 Done! The document for {} has been generated.\n\
             👉 Presentation: {}\n📋 Checklist: {}\n",
            request.title,
            document.url,
            file_view_url(checklist_id)
        );

        if !targets.email_documents {
            return Ok(Some(message));
        }

        // Links first, mailing can take a while.
        self.notify(request, &message).await;
        let sent = self
            .email_documents(
                &document,
                Some(checklist_id),
                &request.requester,
                &request.title,
            )
            .await?;
        Ok(sent.then(|| EMAIL_SENT_NOTICE.to_string()))
    }

    async fn notify(&self, request: &SubmissionRequest, text: &str) {
        let Some(space) = request.space.as_deref().filter(|s| !s.is_empty()) else {
            warn!("No chat space on the submission, dropping notification");
            return;
        };
        let thread = request.thread.as_deref().filter(|t| !t.is_empty());
        if let Err(e) = self.chat.post_message(space, thread, text, None).await {
            error!(space, "Failed to post chat notification: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{FakeDocumentStore, RecordingChat, RecordingMailer};

    fn targets() -> DocumentTargets {
        let plain = |name: &str| VariantTargets {
            template_id: format!("{}-template", name),
            folder_id: format!("{}-folder", name),
            checklist_id: None,
            email_documents: false,
        };
        DocumentTargets {
            form_a: VariantTargets {
                checklist_id: Some("checklist".to_string()),
                email_documents: true,
                ..plain("a")
            },
            subtype_a: plain("sub-a"),
            subtype_b: plain("sub-b"),
        }
    }

    fn request(variant: FormVariant) -> SubmissionRequest {
        let mut values = BTreeMap::new();
        values.insert("client_name".to_string(), "Acme".to_string());
        values.insert("price_phase1_after".to_string(), "900,00".to_string());
        SubmissionRequest {
            variant,
            title: "Acme".to_string(),
            values,
            requester: Requester {
                email: "jan@example.com".to_string(),
                display_name: "Jan".to_string(),
            },
            space: Some("spaces/AAA".to_string()),
            thread: Some("spaces/AAA/threads/T".to_string()),
        }
    }

    struct Harness {
        store: FakeDocumentStore,
        mailer: RecordingMailer,
        chat: RecordingChat,
        orchestrator: DocumentGenerationOrchestrator,
    }

    fn harness(store: FakeDocumentStore) -> Harness {
        harness_with(store, Some(RecordingMailer::default()))
    }

    fn harness_with(store: FakeDocumentStore, mailer: Option<RecordingMailer>) -> Harness {
        let chat = RecordingChat::default();
        let orchestrator = DocumentGenerationOrchestrator::new(
            Arc::new(store.clone()),
            mailer
                .clone()
                .map(|m| Arc::new(m) as Arc<dyn Mailer>),
            Arc::new(chat.clone()),
            targets(),
        );
        Harness {
            store,
            mailer: mailer.unwrap_or_default(),
            chat,
            orchestrator,
        }
    }

    #[test]
    fn placeholders_are_wrapped_in_braces() {
        let mut values = BTreeMap::new();
        values.insert("client_name".to_string(), "{{discount}}".to_string());

        let map = placeholder_map(&values);

        assert_eq!(map.get("{{client_name}}").map(String::as_str), Some("{{discount}}"));
    }

    #[tokio::test]
    async fn subtype_submission_copies_fills_shares_and_notifies() {
        let h = harness(FakeDocumentStore::default());

        h.orchestrator.run(request(FormVariant::SubtypeB)).await;

        let copies = h.store.copies();
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0], ("sub-b-template".into(), "Acme".into(), "sub-b-folder".into()));

        let fills = h.store.fills();
        assert_eq!(fills[0].1.get("{{price_phase1_after}}").map(String::as_str), Some("900,00"));
        assert_eq!(h.store.shares(), vec![("doc-1".to_string(), "jan@example.com".to_string())]);

        let posts = h.chat.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].thread.as_deref(), Some("spaces/AAA/threads/T"));
        assert!(posts[0].text.contains("https://docs.google.com/presentation/d/doc-1/edit"));
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn form_a_shares_checklist_and_emails_both_exports() {
        let h = harness(FakeDocumentStore::default());

        h.orchestrator.run(request(FormVariant::FormA)).await;

        let shares = h.store.shares();
        assert!(shares.contains(&("checklist".to_string(), "jan@example.com".to_string())));

        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Your generated documents for Acme");
        let names: Vec<&str> = sent[0].attachments.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["Acme.pptx", "Checklist.pdf"]);
        assert_eq!(
            h.store.exports(),
            vec![
                ("doc-1".to_string(), PRESENTATION_MIME.to_string()),
                ("checklist".to_string(), PDF_MIME.to_string()),
            ]
        );

        let posts = h.chat.posts();
        assert!(posts[0].text.contains("https://docs.google.com/file/d/checklist/view"));
    }

    #[tokio::test]
    async fn failures_become_a_chat_message() {
        let h = harness(FakeDocumentStore::failing_copy());

        h.orchestrator.run(request(FormVariant::SubtypeA)).await;

        let posts = h.chat.posts();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].text.starts_with("A critical error occurred: "));
        assert!(h.store.fills().is_empty());
    }

    #[tokio::test]
    async fn missing_space_drops_the_notification() {
        let h = harness(FakeDocumentStore::default());
        let mut req = request(FormVariant::SubtypeA);
        req.space = None;

        h.orchestrator.run(req).await;

        assert!(h.chat.posts().is_empty());
        assert_eq!(h.store.copies().len(), 1);
    }

    #[tokio::test]
    async fn blank_requester_email_is_not_shared() {
        let h = harness(FakeDocumentStore::default());
        let mut req = request(FormVariant::SubtypeA);
        req.requester.email.clear();

        h.orchestrator.run(req).await;

        assert!(h.store.shares().is_empty());
    }

    #[tokio::test]
    async fn form_a_announces_email_only_after_sending() {
        let h = harness(FakeDocumentStore::default());

        h.orchestrator.run(request(FormVariant::FormA)).await;

        let posts = h.chat.posts();
        assert_eq!(posts.len(), 2);
        assert!(posts[0].text.starts_with("🎉 Done!"));
        assert!(posts[0].text.contains("\n👉 Presentation: "));
        assert_eq!(posts[1].text, EMAIL_SENT_NOTICE);
    }

    #[tokio::test]
    async fn form_a_without_mailer_does_not_claim_email() {
        let h = harness_with(FakeDocumentStore::default(), None);

        h.orchestrator.run(request(FormVariant::FormA)).await;

        let posts = h.chat.posts();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].text.starts_with("🎉 Done!"));
        assert!(posts.iter().all(|p| !p.text.contains("e-mail")));
        assert!(h.store.exports().is_empty());
    }

    #[tokio::test]
    async fn form_a_with_blank_email_does_not_claim_email() {
        let h = harness(FakeDocumentStore::default());
        let mut req = request(FormVariant::FormA);
        req.requester.email.clear();

        h.orchestrator.run(req).await;

        let posts = h.chat.posts();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].text.starts_with("🎉 Done!"));
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn failed_export_drops_only_that_attachment() {
        let h = harness(FakeDocumentStore::failing_export("checklist"));

        h.orchestrator.run(request(FormVariant::FormA)).await;

        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 1);
        let names: Vec<&str> = sent[0].attachments.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["Acme.pptx"]);
        assert_eq!(h.chat.posts().last().map(|p| p.text.as_str()), Some(EMAIL_SENT_NOTICE));
    }

    #[tokio::test]
    async fn mailer_failure_is_reported_after_the_links() {
        let h = harness_with(FakeDocumentStore::default(), Some(RecordingMailer::failing()));

        h.orchestrator.run(request(FormVariant::FormA)).await;

        let posts = h.chat.posts();
        assert_eq!(posts.len(), 2);
        assert!(posts[0].text.starts_with("🎉 Done!"));
        assert!(posts[1].text.starts_with("A critical error occurred: "));
        assert!(posts[1].text.contains("relay refused"));
    }
}
