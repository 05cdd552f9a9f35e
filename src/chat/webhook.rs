// =============================================================================
// WEBHOOK - HTTP ingress for Google Chat events
// =============================================================================
//
// `POST /` receives every chat event and answers synchronously with the
// rendered reply. Downstream failures never surface as 5xx: the router
// already degrades them into chat text or background notifications.

use super::event::ChatEvent;
use super::render::render_reply;
use crate::core::ai::AiProvider;
use crate::core::dispatch::FormRouter;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::sync::Arc;

pub fn router<P: AiProvider + 'static>(forms: Arc<FormRouter<P>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", post(handle_event::<P>))
        .with_state(forms)
}

async fn health() -> impl IntoResponse {
    "ok"
}

async fn handle_event<P: AiProvider + 'static>(
    State(forms): State<Arc<FormRouter<P>>>,
    Json(event): Json<ChatEvent>,
) -> Json<Value> {
    let interaction = event.into_interaction();
    tracing::info!(
        kind = ?interaction.kind,
        function = interaction.invoked_function.as_deref().unwrap_or(""),
        space = interaction.conversation.space.as_deref().unwrap_or(""),
        "Received chat event"
    );

    let reply = forms.dispatch(&interaction).await;
    Json(render_reply(&reply))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ai::{AiConfig, AiService, ModeProfile};
    use crate::core::dispatch::WelcomeSettings;
    use crate::core::documents::{
        DocumentGenerationOrchestrator, DocumentTargets, PeopleDirectory, VariantTargets,
    };
    use crate::core::forms::{ExtractionPipeline, MultiStepForm, ValueExtractor};
    use crate::core::test_support::{
        FakeDocumentStore, FakeSheet, RecordingChat, RecordingSpawner, ScriptedAi,
    };

    fn forms(ai: ScriptedAi) -> Arc<FormRouter<ScriptedAi>> {
        let profile = |model: &str| ModeProfile {
            config: AiConfig::for_model(model),
            system_instruction: String::new(),
        };
        let service = Arc::new(AiService::new(ai, profile("fast"), profile("research")));
        let chat = Arc::new(RecordingChat::default());
        let spawner = Arc::new(RecordingSpawner::default());
        let target = VariantTargets {
            template_id: "template".into(),
            folder_id: "folder".into(),
            checklist_id: None,
            email_documents: false,
        };
        let orchestrator = DocumentGenerationOrchestrator::new(
            Arc::new(FakeDocumentStore::default()),
            None,
            chat.clone(),
            DocumentTargets {
                form_a: target.clone(),
                subtype_a: target.clone(),
                subtype_b: target,
            },
        );
        let multi_step = MultiStepForm::new(
            ExtractionPipeline::new(Arc::clone(&service)),
            Arc::new(orchestrator),
            PeopleDirectory::new(Arc::new(FakeSheet::default()), "s".into(), "r".into()),
            chat.clone(),
            spawner.clone(),
            ValueExtractor::new(chrono_tz::Europe::Warsaw),
        );
        Arc::new(FormRouter::new(
            service,
            multi_step,
            chat,
            spawner,
            WelcomeSettings::default(),
        ))
    }

    async fn post_event(ai: ScriptedAi, body: &str) -> Value {
        let event: ChatEvent = serde_json::from_str(body).unwrap();
        let Json(reply) = handle_event(State(forms(ai)), Json(event)).await;
        reply
    }

    #[tokio::test]
    async fn plain_message_gets_text_answer() {
        let reply = post_event(
            ScriptedAi::replying("VAT is a consumption tax."),
            r#"{"type": "MESSAGE", "message": {"text": "What is VAT?"}}"#,
        )
        .await;

        assert_eq!(reply["text"], "VAT is a consumption tax.");
    }

    #[tokio::test]
    async fn unknown_event_gets_empty_body() {
        let reply = post_event(ScriptedAi::failing(), r#"{"type": "REMOVED_FROM_SPACE"}"#).await;
        assert_eq!(reply, serde_json::json!({}));
    }

    #[tokio::test]
    async fn form_b_button_opens_dialog() {
        let reply = post_event(
            ScriptedAi::failing(),
            r#"{"type": "CARD_CLICKED", "common": {"invokedFunction": "openFormBDialog"}}"#,
        )
        .await;

        assert_eq!(reply["actionResponse"]["type"], "DIALOG");
    }

    #[tokio::test]
    async fn added_to_space_gets_welcome_card() {
        let reply = post_event(
            ScriptedAi::failing(),
            r#"{"type": "ADDED_TO_SPACE", "space": {"name": "spaces/A", "type": "ROOM"}}"#,
        )
        .await;

        assert!(reply["cardsV2"].is_array());
        assert!(reply["text"].is_string());
    }

    #[tokio::test]
    async fn health_says_ok() {
        let response = health().await.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
