// Top-level dispatcher: event type, then slash command id or invoked function.
//
// Routing is exact-match only. Anything we do not recognise (an unknown
// command id, an unknown function identifier, an unknown event type) produces
// an empty reply and a log line, never an error.

use crate::core::ai::{AiProvider, AiService, GenerationMode};
use crate::core::documents::ChatNotifier;
use crate::core::forms::dialog_builder;
use crate::core::forms::{EventKind, FormVariant, Interaction, MultiStepForm, Reply, StepId};
use crate::core::tasks::TaskSpawner;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const RESEARCH_GUIDANCE: &str =
    "Please provide a topic for research, e.g., /research Impact of AI on the job market.";
pub const RESEARCH_STARTED: &str = "Research in progress. The results will be posted shortly...";
pub const EMPTY_MESSAGE_REPLY: &str =
    "Sorry, I could not understand your message. The text is empty.";
const RESEARCH_PREFIX: &str = "**Detailed Research Results:**\n\n";
const RESEARCH_KEYWORD: &str = "/research";

/// Slash commands as registered with the chat app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashCommand {
    About,
    Research,
    FormA,
    FormB,
}

impl SlashCommand {
    pub fn from_id(id: &str) -> Option<SlashCommand> {
        match id {
            "1" => Some(SlashCommand::About),
            "2" => Some(SlashCommand::Research),
            "3" => Some(SlashCommand::FormA),
            "4" => Some(SlashCommand::FormB),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WelcomeSettings {
    pub image_url: String,
    pub help_url: String,
}

pub struct FormRouter<P: AiProvider> {
    ai: Arc<AiService<P>>,
    forms: MultiStepForm<P>,
    chat: Arc<dyn ChatNotifier>,
    spawner: Arc<dyn TaskSpawner>,
    welcome: WelcomeSettings,
}

impl<P: AiProvider + 'static> FormRouter<P> {
    pub fn new(
        ai: Arc<AiService<P>>,
        forms: MultiStepForm<P>,
        chat: Arc<dyn ChatNotifier>,
        spawner: Arc<dyn TaskSpawner>,
        welcome: WelcomeSettings,
    ) -> Self {
        Self {
            ai,
            forms,
            chat,
            spawner,
            welcome,
        }
    }

    pub async fn dispatch(&self, interaction: &Interaction) -> Reply {
        match interaction.kind {
            EventKind::Message => self.on_message(interaction).await,
            EventKind::CardClicked => self.on_card_click(interaction).await,
            EventKind::AddedToSpace => self.on_added_to_space(interaction),
            EventKind::Other => Reply::Empty,
        }
    }

    async fn on_message(&self, interaction: &Interaction) -> Reply {
        if let Some(command_id) = &interaction.slash_command {
            info!(command_id = %command_id, "Slash command");
            return match SlashCommand::from_id(command_id) {
                Some(command) => self.run_command(command, interaction).await,
                None => {
                    warn!(command_id = %command_id, "No handler for slash command");
                    Reply::Empty
                }
            };
        }

        let text = interaction.text.trim();
        if text.is_empty() {
            return Reply::Text(EMPTY_MESSAGE_REPLY.to_string());
        }

        if let Some(query) = strip_research_keyword(text) {
            if query.is_empty() {
                return Reply::Text(RESEARCH_GUIDANCE.to_string());
            }
            let answer = self.ai.respond(query, GenerationMode::Research).await;
            return Reply::Text(format!("{}{}", RESEARCH_PREFIX, answer));
        }

        Reply::Text(self.ai.respond(text, GenerationMode::Fast).await)
    }

    async fn run_command(&self, command: SlashCommand, interaction: &Interaction) -> Reply {
        match command {
            SlashCommand::About => Reply::Dialog(dialog_builder::about_dialog()),
            SlashCommand::Research => self.start_research(interaction),
            SlashCommand::FormA => self.forms.open_form_a().await,
            SlashCommand::FormB => self.forms.open_form_b(),
        }
    }

    /// Research answers are slow, so they are posted back into the thread later.
    fn start_research(&self, interaction: &Interaction) -> Reply {
        let topic = interaction.argument_text.trim().to_string();
        if topic.is_empty() {
            return Reply::Text(RESEARCH_GUIDANCE.to_string());
        }

        let ai = Arc::clone(&self.ai);
        let chat = Arc::clone(&self.chat);
        let space = interaction.conversation.space.clone();
        let thread = interaction.conversation.thread.clone();

        self.spawner.spawn(
            "research",
            Box::pin(async move {
                let answer = ai.respond(&topic, GenerationMode::Research).await;
                let Some(space) = space else {
                    warn!("Research finished but the event had no space to reply in");
                    return;
                };
                let text = format!("{}{}", RESEARCH_PREFIX, answer);
                if let Err(e) = chat
                    .post_message(&space, thread.as_deref(), &text, None)
                    .await
                {
                    error!(space = %space, "Failed to post research results: {}", e);
                }
            }),
        );

        Reply::Text(RESEARCH_STARTED.to_string())
    }

    async fn on_card_click(&self, interaction: &Interaction) -> Reply {
        let Some(function) = interaction.invoked_function.as_deref() else {
            warn!("Card click without an invoked function");
            return Reply::Empty;
        };
        let Some(step) = StepId::parse(function) else {
            warn!(function, "No handler found for invoked function");
            return Reply::Empty;
        };
        info!(function, "Card action");

        match step {
            StepId::OpenFormA => self.forms.open_form_a().await,
            StepId::ConfirmFormA => self.forms.confirm_form_a(interaction),
            StepId::SubmitFormA => self.forms.submit(FormVariant::FormA, interaction),
            StepId::OpenFormB => self.forms.open_form_b(),
            StepId::RouteFormB => self.forms.route_form_b(interaction),
            StepId::Extract(variant) => self.forms.extract(variant, interaction),
            StepId::Confirm(variant) => self.forms.confirm(variant, interaction),
            StepId::Submit(variant) => self.forms.submit(variant, interaction),
        }
    }

    fn on_added_to_space(&self, interaction: &Interaction) -> Reply {
        info!(is_room = interaction.conversation.is_room, "Added to a space");
        let (card, text) = dialog_builder::welcome_card(
            interaction.conversation.is_room,
            &self.welcome.image_url,
            &self.welcome.help_url,
        );
        Reply::CardMessage { card, text }
    }
}

/// The query after a leading `/research` keyword (any case), if present.
fn strip_research_keyword(text: &str) -> Option<&str> {
    let head = text.get(..RESEARCH_KEYWORD.len())?;
    if head.eq_ignore_ascii_case(RESEARCH_KEYWORD) {
        Some(text[RESEARCH_KEYWORD.len()..].trim())
    } else {
        None
    }
}
