// Outbound messages into Chat spaces, authenticated as the bot.

use super::render::render_outbound_message;
use crate::core::documents::{ChatNotifier, WorkspaceError};
use crate::core::forms::Card;
use crate::infra::google::{GoogleAuth, CHAT_BOT_SCOPE};
use async_trait::async_trait;
use reqwest::Client;

const CHAT_API_URL: &str = "https://chat.googleapis.com/v1";

pub struct GoogleChatClient {
    client: Client,
    auth: GoogleAuth,
}

impl GoogleChatClient {
    pub fn new(auth: GoogleAuth) -> Self {
        Self {
            client: Client::new(),
            auth,
        }
    }
}

fn messages_url(space: &str) -> String {
    format!("{}/{}/messages", CHAT_API_URL, space.trim_matches('/'))
}

#[async_trait]
impl ChatNotifier for GoogleChatClient {
    async fn post_message(
        &self,
        space: &str,
        thread: Option<&str>,
        text: &str,
        card: Option<&Card>,
    ) -> Result<(), WorkspaceError> {
        let token = self.auth.access_token(&[CHAT_BOT_SCOPE]).await?;
        let body = render_outbound_message(text, thread, card);

        let mut request = self.client.post(messages_url(space)).bearer_auth(token);
        if thread.is_some() {
            request = request.query(&[(
                "messageReplyOption",
                "REPLY_MESSAGE_FALLBACK_TO_NEW_THREAD",
            )]);
        }

        let response = request.json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(WorkspaceError::Api {
                service: "Chat",
                status,
                body,
            });
        }

        tracing::debug!("Posted message to {}", space);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_url_uses_space_resource_name() {
        assert_eq!(
            messages_url("spaces/AAAA"),
            "https://chat.googleapis.com/v1/spaces/AAAA/messages"
        );
        assert_eq!(
            messages_url("/spaces/AAAA/"),
            "https://chat.googleapis.com/v1/spaces/AAAA/messages"
        );
    }
}
