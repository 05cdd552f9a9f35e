// =============================================================================
// GEMINI CLIENT - Google AI Studio API Integration
// =============================================================================
//
// Implementation of the `AiProvider` trait on top of the Gemini
// generateContent endpoint (https://ai.google.dev/gemini-api/docs).
//
// **Differences from OpenRouter:**
// - Authentication: API key is passed as a query parameter (`?key=API_KEY`)
//   rather than a Bearer token in the Authorization header.
// - Request format: Uses `contents[]` with nested `parts`, and `systemInstruction`
//   is a separate top-level field (not a message with role "system").
// - Response format: Content is at `candidates[0].content.parts[].text`.
//
// **Environment Variables:**
// - `GEMINI_API_KEY` - API key from https://aistudio.google.com/apikey

use crate::core::ai::{
    models::{AiConfig, AiMessage, AiProviderResponse},
    AiProvider,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

// =============================================================================
// GEMINI API DATA STRUCTURES
// =============================================================================
//
// See: https://ai.google.dev/api/generate-content

/// A single part of content. Thought parts carry `thought: true`.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,

    #[serde(skip_serializing)]
    thought: Option<bool>,
}

/// A message in Gemini's format.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct Content {
    /// "user" or "model". Gemini does not know "assistant".
    #[serde(skip_serializing_if = "String::is_empty")]
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

/// The request body sent to the Gemini generateContent endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,

    /// System instruction, separate from the conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,

    /// Why the model stopped generating (e.g., "STOP", "SAFETY").
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

// =============================================================================
// GEMINI CLIENT IMPLEMENTATION
// =============================================================================

/// Client for Google's Gemini API.
///
/// # Example
/// ```ignore
/// let client = GeminiClient::new(std::env::var("GEMINI_API_KEY")?);
/// let messages = vec![AiMessage::user("Hello!")];
/// let response = client
///     .chat_complete(&messages, &AiConfig::for_model("gemini-1.5-flash"))
///     .await?;
/// ```
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    fn text_part(text: String) -> Part {
        Part {
            text: Some(text),
            thought: None,
        }
    }

    /// Converts a generic `AiMessage` to Gemini's `Content`.
    ///
    /// "assistant" becomes "model"; system messages are handled separately.
    fn convert_message(msg: &AiMessage) -> Content {
        let role = match msg.role.as_str() {
            "assistant" => "model".to_string(),
            other => other.to_string(),
        };

        Content {
            role,
            parts: vec![Self::text_part(msg.content.clone())],
        }
    }

    fn build_request(messages: &[AiMessage], config: &AiConfig) -> GenerateContentRequest {
        // All system messages are folded into one instruction.
        let system_parts: Vec<Part> = messages
            .iter()
            .filter(|m| m.role == "system")
            .map(|m| Self::text_part(m.content.clone()))
            .collect();
        let system_instruction = if system_parts.is_empty() {
            None
        } else {
            Some(Content {
                role: String::new(),
                parts: system_parts,
            })
        };

        let contents = messages
            .iter()
            .filter(|m| m.role != "system")
            .map(Self::convert_message)
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: Some(GenerationConfig {
                temperature: Some(config.temperature),
                max_output_tokens: config.max_tokens,
                top_p: config.top_p,
                top_k: None,
            }),
        }
    }

    /// Splits candidate parts into the answer and any thought summaries.
    fn split_parts(parts: &[Part]) -> AiProviderResponse {
        let mut content = Vec::new();
        let mut thinking = Vec::new();
        for part in parts {
            let Some(text) = part.text.as_deref() else {
                continue;
            };
            if part.thought.unwrap_or(false) {
                thinking.push(text);
            } else {
                content.push(text);
            }
        }

        AiProviderResponse {
            content: content.concat(),
            thinking: if thinking.is_empty() {
                None
            } else {
                Some(thinking.join("\n\n"))
            },
        }
    }
}

#[async_trait]
impl AiProvider for GeminiClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_BASE_URL, config.model, self.api_key
        );
        let request = Self::build_request(messages, config);

        // Never log the URL, it carries the key.
        tracing::debug!(
            "Gemini request to model {}: {} messages",
            config.model,
            messages.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;

            if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(&error_text) {
                return Err(format!(
                    "Gemini API error ({}): {}",
                    status, error_response.error.message
                )
                .into());
            }

            return Err(format!("Gemini API error: {} - {}", status, error_text).into());
        }

        let response_json: GenerateContentResponse = response.json().await?;

        let candidate = response_json
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .ok_or(
                "No content in Gemini response - the model may have been blocked by safety filters",
            )?;

        let result = Self::split_parts(&candidate.content.parts);
        if result.content.is_empty() {
            return Err(format!(
                "Gemini returned no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )
            .into());
        }

        tracing::debug!(
            "Gemini response received: {} chars content",
            result.content.len()
        );

        Ok(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_message_user() {
        let content = GeminiClient::convert_message(&AiMessage::user("Hello!"));

        assert_eq!(content.role, "user");
        assert_eq!(content.parts.len(), 1);
        assert_eq!(content.parts[0].text, Some("Hello!".to_string()));
    }

    #[test]
    fn test_convert_message_assistant_to_model() {
        let msg = AiMessage {
            role: "assistant".to_string(),
            content: "Hi there!".to_string(),
        };

        let content = GeminiClient::convert_message(&msg);

        assert_eq!(content.role, "model");
        assert_eq!(content.parts[0].text, Some("Hi there!".to_string()));
    }

    #[test]
    fn test_system_message_becomes_system_instruction() {
        let messages = vec![
            AiMessage::system("Be brief."),
            AiMessage::user("What is VAT?"),
        ];
        let request =
            GeminiClient::build_request(&messages, &AiConfig::for_model("gemini-1.5-flash"));

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json["systemInstruction"]["parts"][0]["text"],
            "Be brief."
        );
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"].as_array().unwrap().len(), 1);
        assert_eq!(json["contents"][0]["role"], "user");
    }

    #[test]
    fn test_generation_config_serialization() {
        let config = GenerationConfig {
            temperature: Some(0.7),
            max_output_tokens: Some(1000),
            top_p: Some(0.9),
            top_k: None,
        };

        let json = serde_json::to_string(&config).unwrap();

        assert!(json.contains("\"temperature\""));
        assert!(json.contains("\"maxOutputTokens\""));
        assert!(json.contains("\"topP\""));
        assert!(!json.contains("topK"));
    }

    #[test]
    fn test_response_thought_parts_are_separated() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking it over", "thought": true},
                    {"text": "Final "},
                    {"text": "answer"}
                ]},
                "finishReason": "STOP"
            }]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        let candidates = parsed.candidates.unwrap();

        let result = GeminiClient::split_parts(&candidates[0].content.parts);

        assert_eq!(result.content, "Final answer");
        assert_eq!(result.thinking.as_deref(), Some("thinking it over"));
    }

    #[test]
    fn test_error_body_parses() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        let parsed: GeminiErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "API key not valid");
    }
}
