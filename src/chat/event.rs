// =============================================================================
// CHAT EVENT - Google Chat interaction payload
// =============================================================================
//
// Deserializes the webhook body Google Chat posts for MESSAGE, CARD_CLICKED
// and ADDED_TO_SPACE events and converts it into the platform-agnostic
// `Interaction`. Every field is optional: dialogs, slash commands and card
// clicks each fill a different subset.

use crate::core::forms::{
    Conversation, EventKind, FormInput, FormInputs, Interaction, ParameterBag, Requester,
};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Numbers that Chat sometimes sends as JSON strings (`"1"`) and sometimes not.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl LooseNumber {
    fn as_i64(&self) -> Option<i64> {
        match self {
            LooseNumber::Int(n) => Some(*n),
            LooseNumber::Float(f) if f.is_finite() => Some(*f as i64),
            LooseNumber::Float(_) => None,
            LooseNumber::Text(s) => s.trim().parse().ok(),
        }
    }

    fn as_text(&self) -> String {
        match self {
            LooseNumber::Int(n) => n.to_string(),
            LooseNumber::Float(f) => f.to_string(),
            LooseNumber::Text(s) => s.clone(),
        }
    }
}

/// Reads an explicit `null` the same way as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatEvent {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub event_type: String,
    pub message: Option<ChatMessage>,
    pub common: Option<CommonEventObject>,
    pub action: Option<FormAction>,
    pub space: Option<Space>,
    pub thread: Option<Thread>,
    pub user: Option<User>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatMessage {
    pub text: Option<String>,
    pub argument_text: Option<String>,
    pub slash_command: Option<SlashCommand>,
    pub thread: Option<Thread>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlashCommand {
    pub command_id: Option<LooseNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommonEventObject {
    pub invoked_function: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub form_inputs: HashMap<String, WireInput>,
    #[serde(deserialize_with = "null_as_default")]
    pub parameters: HashMap<String, Option<String>>,
}

/// Legacy action block; older clients put the function and parameters here.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormAction {
    pub action_method_name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub parameters: Vec<KeyValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct KeyValue {
    #[serde(deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(deserialize_with = "null_as_default")]
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireInput {
    pub string_inputs: Option<StringInputs>,
    pub date_input: Option<DateInput>,
    pub time_input: Option<TimeInput>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StringInputs {
    #[serde(deserialize_with = "null_as_default")]
    pub value: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateInput {
    pub ms_since_epoch: Option<LooseNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TimeInput {
    #[serde(deserialize_with = "null_as_default")]
    pub hours: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub minutes: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Space {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type")]
    pub legacy_type: Option<String>,
    pub space_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Thread {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl WireInput {
    fn to_form_input(&self) -> FormInput {
        if let Some(strings) = &self.string_inputs {
            return FormInput::Text(strings.value.clone());
        }
        if let Some(date) = &self.date_input {
            return match date.ms_since_epoch.as_ref().and_then(LooseNumber::as_i64) {
                Some(ms_since_epoch) => FormInput::Date { ms_since_epoch },
                None => FormInput::Unsupported,
            };
        }
        if let Some(time) = &self.time_input {
            return FormInput::Time {
                hours: time.hours,
                minutes: time.minutes,
            };
        }
        FormInput::Unsupported
    }
}

impl Space {
    fn is_room(&self) -> bool {
        self.legacy_type.as_deref() == Some("ROOM") || self.space_type.as_deref() == Some("SPACE")
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ChatEvent {
    pub fn kind(&self) -> EventKind {
        match self.event_type.as_str() {
            "MESSAGE" => EventKind::Message,
            "CARD_CLICKED" => EventKind::CardClicked,
            "ADDED_TO_SPACE" => EventKind::AddedToSpace,
            _ => EventKind::Other,
        }
    }

    fn invoked_function(&self) -> Option<String> {
        self.common
            .as_ref()
            .and_then(|c| non_empty(c.invoked_function.as_deref()))
            .or_else(|| {
                self.action
                    .as_ref()
                    .and_then(|a| non_empty(a.action_method_name.as_deref()))
            })
    }

    fn parameters(&self) -> ParameterBag {
        let mut bag = ParameterBag::new();
        if let Some(action) = &self.action {
            for kv in &action.parameters {
                bag.insert(kv.key.clone(), kv.value.clone());
            }
        }
        // The common block is authoritative when both are present.
        if let Some(common) = &self.common {
            for (key, value) in &common.parameters {
                bag.insert(key.clone(), value.clone().unwrap_or_default());
            }
        }
        bag
    }

    fn form_inputs(&self) -> FormInputs {
        self.common
            .as_ref()
            .map(|c| {
                c.form_inputs
                    .iter()
                    .map(|(name, input)| (name.clone(), input.to_form_input()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn conversation(&self) -> Conversation {
        let thread = self
            .thread
            .as_ref()
            .and_then(|t| non_empty(Some(t.name.as_str())))
            .or_else(|| {
                self.message
                    .as_ref()
                    .and_then(|m| m.thread.as_ref())
                    .and_then(|t| non_empty(Some(t.name.as_str())))
            });

        Conversation {
            space: self.space.as_ref().and_then(|s| non_empty(Some(s.name.as_str()))),
            thread,
            is_room: self.space.as_ref().map(Space::is_room).unwrap_or(false),
        }
    }

    pub fn into_interaction(self) -> Interaction {
        let mut interaction = Interaction::new(self.kind());

        interaction.invoked_function = self.invoked_function();
        interaction.parameters = self.parameters();
        interaction.form_inputs = self.form_inputs();
        interaction.conversation = self.conversation();

        if let Some(user) = &self.user {
            interaction.requester = Requester {
                email: user.email.clone().unwrap_or_default(),
                display_name: user.display_name.clone().unwrap_or_default(),
            };
        }

        if let Some(message) = self.message {
            interaction.text = message.text.unwrap_or_default();
            interaction.argument_text = message.argument_text.unwrap_or_default();
            interaction.slash_command = message
                .slash_command
                .and_then(|c| c.command_id)
                .map(|id| id.as_text());
        }

        interaction
    }
}
