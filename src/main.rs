// This is the entry point of the chat form agent.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic): forms, AI, document generation
// - `infra/` = Implementations of core traits (Gemini, Google Workspace, SMTP)
// - `chat/` = Google Chat adapters (webhook, payload parsing, card rendering)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Serve the chat webhook

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "chat/chat_layer.rs"]
mod chat;
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::chat::GoogleChatClient;
use crate::config::{AiBackend, AppConfig};
use crate::core::ai::{AiProvider, AiService};
use crate::core::dispatch::FormRouter;
use crate::core::documents::{
    ChatNotifier, DocumentGenerationOrchestrator, Mailer, PeopleDirectory,
};
use crate::core::forms::{ExtractionPipeline, MultiStepForm, ValueExtractor};
use crate::core::tasks::{TaskSpawner, TokioSpawner};
use crate::infra::ai::{GeminiClient, OpenRouterClient};
use crate::infra::google::{GoogleAuth, GoogleWorkspaceClient};
use crate::infra::mail::SmtpMailer;
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let provider: Box<dyn AiProvider> = match config.ai.backend {
        AiBackend::Gemini => Box::new(GeminiClient::new(config.ai.api_key.clone())),
        AiBackend::OpenRouter => Box::new(OpenRouterClient::new(config.ai.api_key.clone())),
    };
    let ai_service = Arc::new(AiService::new(
        provider,
        config.ai.fast.clone(),
        config.ai.research.clone(),
    ));

    let auth = GoogleAuth::from_sources(
        config.google.key_path.as_deref(),
        config.google.key_json.as_deref(),
    )
    .await
    .context("failed to load Google credentials")?;
    let workspace = Arc::new(GoogleWorkspaceClient::new(auth.clone()));
    let chat: Arc<dyn ChatNotifier> = Arc::new(GoogleChatClient::new(auth));

    let mailer: Option<Arc<dyn Mailer>> = match &config.smtp {
        Some(settings) => Some(Arc::new(
            SmtpMailer::new(settings).context("failed to set up SMTP transport")?,
        )),
        None => {
            tracing::warn!("SMTP_EMAIL/SMTP_PASSWORD not set, documents will not be e-mailed");
            None
        }
    };

    let orchestrator = Arc::new(DocumentGenerationOrchestrator::new(
        workspace.clone(),
        mailer,
        Arc::clone(&chat),
        config.targets.clone(),
    ));
    let people = PeopleDirectory::new(
        workspace,
        config.people.sheet_id.clone(),
        config.people.range.clone(),
    );
    let spawner: Arc<dyn TaskSpawner> = Arc::new(TokioSpawner);

    let forms = MultiStepForm::new(
        ExtractionPipeline::new(Arc::clone(&ai_service)),
        orchestrator,
        people,
        Arc::clone(&chat),
        Arc::clone(&spawner),
        ValueExtractor::new(config.timezone),
    );
    let router = Arc::new(FormRouter::new(
        ai_service,
        forms,
        chat,
        spawner,
        config.welcome.clone(),
    ));

    // ========================================================================
    // HTTP SERVER
    // ========================================================================

    let app = chat::webhook::router(router);
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!("Listening for chat events on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
            }
        })
        .await?;

    Ok(())
}
