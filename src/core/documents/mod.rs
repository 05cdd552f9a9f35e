pub mod orchestrator;
pub mod people;
pub mod ports;

pub use orchestrator::{
    DocumentGenerationOrchestrator, DocumentTargets, SubmissionRequest, VariantTargets,
};
pub use people::PeopleDirectory;
pub use ports::{
    ChatNotifier, DocumentStore, Mailer, OutgoingEmail, SpreadsheetReader,
    WorkspaceError,
};
