// The chat module adapts Google Chat to the core: webhook ingress, payload
// parsing, card rendering and the outbound message client.

#[path = "event.rs"]
pub mod event;

#[path = "render.rs"]
pub mod render;

#[path = "chat_client.rs"]
pub mod chat_client;

#[path = "webhook.rs"]
pub mod webhook;

pub use chat_client::GoogleChatClient;
