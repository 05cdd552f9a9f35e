// Step handlers for Form A and the Form B sub-types.
//
// Handlers are stateless. Everything a later step needs is either re-submitted
// as form input or carried in the action parameter bag of the button the user
// clicks, so a form in progress lives entirely on the client.

use super::dialog::Reply;
use super::dialog_builder;
use super::extraction::ExtractionPipeline;
use super::form_schema::{
    FormSchema, FormVariant, DISCOUNT_FIELD, FORM_A_SCHEMA, NOTES_FIELD, PRICED_FIELDS,
    SPACE_PARAM, SUBTYPE_FIELD, THREAD_PARAM,
};
use super::form_values::{Interaction, ParameterBag, ValueExtractor};
use super::pricing::apply_discount;
use crate::core::ai::AiProvider;
use crate::core::documents::{
    ChatNotifier, DocumentGenerationOrchestrator, PeopleDirectory, SubmissionRequest,
};
use crate::core::tasks::TaskSpawner;
use std::sync::Arc;
use tracing::{error, info, warn};

const PROCESSING_REPLY: &str = "Processing with AI...";
const VERIFY_PROMPT: &str = "Please verify the data extracted by the AI.";
const FORM_A_SUBMITTED_REPLY: &str =
    "Processing your request... The document will be ready in about 2 minutes.";
const UNKNOWN_CLIENT: &str = "Unknown Client";
const NO_SPACE_REPLY: &str = "The extracted data cannot be delivered here because this \
conversation has no chat space. Please open the form from a chat space.";

pub struct MultiStepForm<P: AiProvider> {
    extraction: Arc<ExtractionPipeline<P>>,
    orchestrator: Arc<DocumentGenerationOrchestrator>,
    people: Arc<PeopleDirectory>,
    chat: Arc<dyn ChatNotifier>,
    spawner: Arc<dyn TaskSpawner>,
    values: ValueExtractor,
}

impl<P: AiProvider + 'static> MultiStepForm<P> {
    pub fn new(
        extraction: ExtractionPipeline<P>,
        orchestrator: Arc<DocumentGenerationOrchestrator>,
        people: PeopleDirectory,
        chat: Arc<dyn ChatNotifier>,
        spawner: Arc<dyn TaskSpawner>,
        values: ValueExtractor,
    ) -> Self {
        Self {
            extraction: Arc::new(extraction),
            orchestrator,
            people: Arc::new(people),
            chat,
            spawner,
            values,
        }
    }

    fn read(&self, interaction: &Interaction, field: &str) -> String {
        self.values.extract(&interaction.form_inputs, field)
    }

    /// Reads `fields` from the submitted form into a bag.
    fn collect(&self, interaction: &Interaction, fields: &[&str]) -> ParameterBag {
        self.values
            .extract_all(&interaction.form_inputs, fields)
            .into_iter()
            .collect()
    }

    fn with_conversation(mut bag: ParameterBag, interaction: &Interaction) -> ParameterBag {
        let conversation = &interaction.conversation;
        bag.insert(SPACE_PARAM, conversation.space.clone().unwrap_or_default());
        bag.insert(THREAD_PARAM, conversation.thread.clone().unwrap_or_default());
        bag
    }

    // ========================================================================
    // FORM A
    // ========================================================================

    pub async fn open_form_a(&self) -> Reply {
        let people = match self.people.list().await {
            Ok(people) => people.into_iter().map(|p| p.name).collect(),
            Err(e) => {
                error!("Failed to read people sheet: {}", e);
                Vec::new()
            }
        };
        let now_ms = chrono::Utc::now().timestamp_millis();
        Reply::Dialog(dialog_builder::form_a_entry(&people, now_ms))
    }

    pub fn confirm_form_a(&self, interaction: &Interaction) -> Reply {
        let fields: Vec<&str> = FORM_A_SCHEMA.detail_fields.iter().map(|f| f.name).collect();
        let carried = Self::with_conversation(self.collect(interaction, &fields), interaction);
        Reply::Dialog(dialog_builder::form_a_confirmation(&carried))
    }

    // ========================================================================
    // FORM B
    // ========================================================================

    pub fn open_form_b(&self) -> Reply {
        Reply::Dialog(dialog_builder::form_b_entry())
    }

    /// Step 1 submit: picks the sub-type branch from the dropdown.
    pub fn route_form_b(&self, interaction: &Interaction) -> Reply {
        let choice = self.read(interaction, SUBTYPE_FIELD);
        let variant = FormVariant::from_subtype_choice(&choice);
        info!(choice = %choice, variant = variant.key(), "Routing Form B");
        self.open_details(variant, interaction)
    }

    pub fn open_details(&self, variant: FormVariant, interaction: &Interaction) -> Reply {
        let notes = self.read(interaction, NOTES_FIELD);
        Reply::Dialog(dialog_builder::subtype_details(variant.schema(), &notes))
    }

    /// Step 3: acknowledges immediately, extracts in the background and posts
    /// the verification card into the originating thread.
    pub fn extract(&self, variant: FormVariant, interaction: &Interaction) -> Reply {
        let schema: &'static FormSchema = variant.schema();
        let notes = self.read(interaction, NOTES_FIELD);
        let raw_fields: Vec<&str> = schema
            .duration_fields
            .iter()
            .chain(schema.pricing_fields.iter())
            .map(|f| f.name)
            .collect();
        let raw_inputs = self.collect(interaction, &raw_fields);

        let Some(space) = interaction.conversation.space.clone() else {
            warn!(variant = variant.key(), "Extraction requested without a space");
            return Reply::NewMessage(NO_SPACE_REPLY.to_string());
        };
        let thread = interaction.conversation.thread.clone();
        let extraction = Arc::clone(&self.extraction);
        let chat = Arc::clone(&self.chat);

        self.spawner.spawn(
            "form-extraction",
            Box::pin(async move {
                let record = extraction.extract(schema, &notes, &raw_inputs).await;
                let card = dialog_builder::verification_card(schema, &record);
                if let Err(e) = chat
                    .post_message(&space, thread.as_deref(), VERIFY_PROMPT, Some(&card))
                    .await
                {
                    error!(
                        variant = schema.variant.key(),
                        "Failed to post verification card: {}", e
                    );
                }
            }),
        );

        Reply::NewMessage(PROCESSING_REPLY.to_string())
    }

    /// Step 4: applies the discount and shows the final summary.
    pub fn confirm(&self, variant: FormVariant, interaction: &Interaction) -> Reply {
        let schema = variant.schema();
        let mut carried = self.collect(interaction, &schema.confirmed_keys());

        // A bad discount means no discount for every price in this step.
        let discount = carried.get(DISCOUNT_FIELD).to_string();
        for priced in PRICED_FIELDS {
            let after = apply_discount(carried.get(priced.before), &discount);
            carried.insert(priced.after, after);
        }

        let carried = Self::with_conversation(carried, interaction);
        Reply::Dialog(dialog_builder::final_confirmation(schema, &carried))
    }

    /// Terminal step: hands the carried values to the orchestrator and returns.
    /// Every click starts its own generation run.
    pub fn submit(&self, variant: FormVariant, interaction: &Interaction) -> Reply {
        let params = interaction.parameters.clone();
        let title = match variant {
            FormVariant::FormA => format!("{} - Generated Document", params.get("field1")),
            _ => Some(params.get("client_name"))
                .filter(|name| !name.is_empty())
                .unwrap_or(UNKNOWN_CLIENT)
                .to_string(),
        };
        let non_empty = |value: &str| Some(value.to_string()).filter(|v| !v.is_empty());
        let conversation = &interaction.conversation;
        let space = non_empty(params.get(SPACE_PARAM)).or_else(|| conversation.space.clone());
        let thread = non_empty(params.get(THREAD_PARAM)).or_else(|| conversation.thread.clone());

        let mut request = SubmissionRequest {
            variant,
            title,
            values: params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            requester: interaction.requester.clone(),
            space,
            thread,
        };

        let orchestrator = Arc::clone(&self.orchestrator);
        let people = Arc::clone(&self.people);
        self.spawner.spawn(
            "document-generation",
            Box::pin(async move {
                if request.variant == FormVariant::FormA {
                    let selected = request.values.get("dropdown1").cloned().unwrap_or_default();
                    match people.find(&selected).await {
                        Ok(Some(person)) => request.values.extend(person.placeholders()),
                        Ok(None) => {}
                        Err(e) => warn!("Person lookup failed, continuing without it: {}", e),
                    }
                }
                orchestrator.run(request).await;
            }),
        );

        match variant {
            FormVariant::FormA => Reply::NewMessage(FORM_A_SUBMITTED_REPLY.to_string()),
            _ => Reply::NewMessage(format!(
                "Starting document generation for {}. You'll be notified when it's ready.",
                variant.label()
            )),
        }
    }
}
