pub mod service_account;
pub mod workspace_client;

pub use service_account::{GoogleAuth, CHAT_BOT_SCOPE};
pub use workspace_client::GoogleWorkspaceClient;
