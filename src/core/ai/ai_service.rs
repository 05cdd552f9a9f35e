use super::models::{AiConfig, AiMessage, AiProviderResponse, GenerationMode, ModeProfile};
use async_trait::async_trait;
use std::error::Error;

/// Returned to chat users whenever the model cannot be reached.
pub const AI_UNAVAILABLE_REPLY: &str =
    "Sorry, there was a problem with the AI. Please try again later.";

pub const DEFAULT_FAST_INSTRUCTION: &str = "You are an AI assistant. Your task is to provide helpful and factual answers to questions \
on business and general knowledge topics. Respond in a professional but approachable tone. \
Keep your answers concise and quick. Respond as if in a chat message, not a scientific article. \
Do not use bolding, headers, lists, Markdown, or HTML. Respond only with plain text.";

pub const DEFAULT_RESEARCH_INSTRUCTION: &str = "You are an advanced AI assistant. Your task is to conduct detailed research and provide \
comprehensive, in-depth answers to complex questions on business and specialized topics. \
Use a professional, analytical tone. Your answers can be longer but should not be extensive essays. \
Act like a top-tier consultant, always ready to help. \
Respond as if in a chat message, not a scientific article. \
Do not use bolding, headers, lists, Markdown, or HTML. Respond only with plain text.";

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request to the AI provider.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>>;
}

// Blanket implementation for Box<dyn AiProvider>
// This lets the composition root pick Gemini or OpenRouter at runtime while
// the service stays generic.
#[async_trait]
impl AiProvider for Box<dyn AiProvider> {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        (**self).chat_complete(messages, config).await
    }
}

pub struct AiService<P: AiProvider> {
    provider: P,
    fast: ModeProfile,
    research: ModeProfile,
}

impl<P: AiProvider> AiService<P> {
    pub fn new(provider: P, fast: ModeProfile, research: ModeProfile) -> Self {
        Self {
            provider,
            fast,
            research,
        }
    }

    fn profile(&self, mode: GenerationMode) -> &ModeProfile {
        match mode {
            GenerationMode::Fast => &self.fast,
            GenerationMode::Research => &self.research,
        }
    }

    /// Runs a single-turn completion and returns the model's text.
    pub async fn generate(
        &self,
        prompt: &str,
        mode: GenerationMode,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let profile = self.profile(mode);
        let messages = vec![
            AiMessage::system(profile.system_instruction.clone()),
            AiMessage::user(format!("User Query: {}\n\nResponse:", prompt)),
        ];

        tracing::debug!(model = %profile.config.model, ?mode, "Sending prompt to AI");
        let response = self
            .provider
            .chat_complete(&messages, &profile.config)
            .await?;
        tracing::debug!(chars = response.content.len(), "Received AI response");
        if let Some(thinking) = &response.thinking {
            tracing::debug!(chars = thinking.len(), "Model returned thought summary");
        }

        Ok(response.content)
    }

    /// Like `generate`, but a failure becomes the apology text instead of an error.
    pub async fn respond(&self, prompt: &str, mode: GenerationMode) -> String {
        match self.generate(prompt, mode).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("AI error during response generation: {}", e);
                AI_UNAVAILABLE_REPLY.to_string()
            }
        }
    }
}
