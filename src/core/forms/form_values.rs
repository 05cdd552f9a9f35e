// Platform-agnostic view of one chat interaction and the values it carries.
//
// The chat layer converts the webhook payload into an `Interaction`; every step
// handler reads user input through `ValueExtractor` and carried state through
// `ParameterBag`, never through the raw payload.

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::{BTreeMap, HashMap};

/// One submitted form widget, as far as the bot cares about it.
#[derive(Debug, Clone, PartialEq)]
pub enum FormInput {
    /// Text inputs and dropdowns both submit a list of strings.
    Text(Vec<String>),
    /// A date picker value in milliseconds since the Unix epoch.
    Date { ms_since_epoch: i64 },
    /// A time picker value.
    Time { hours: u32, minutes: u32 },
    /// Any widget kind we do not read (checkboxes, date-time, ...).
    Unsupported,
}

pub type FormInputs = HashMap<String, FormInput>;

/// The action parameter bag: the key/value list a button carries and the
/// client echoes back on the next interaction. It is the only session state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBag {
    entries: BTreeMap<String, String>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    #[cfg(test)]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Missing keys read as the empty string, like missing form fields.
    pub fn get(&self, key: &str) -> &str {
        self.entries.get(key).map(String::as_str).unwrap_or("")
    }

    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.entries.iter()
    }
}

impl FromIterator<(String, String)> for ParameterBag {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Who clicked or typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Requester {
    pub email: String,
    pub display_name: String,
}

/// Where a reply or notification should go.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    pub space: Option<String>,
    pub thread: Option<String>,
    /// True for multi-user rooms, false for direct messages.
    pub is_room: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Message,
    CardClicked,
    AddedToSpace,
    Other,
}

/// Everything a step handler may need from one inbound chat event.
#[derive(Debug, Clone)]
pub struct Interaction {
    pub kind: EventKind,
    pub text: String,
    pub argument_text: String,
    pub slash_command: Option<String>,
    pub invoked_function: Option<String>,
    pub form_inputs: FormInputs,
    pub parameters: ParameterBag,
    pub conversation: Conversation,
    pub requester: Requester,
}

impl Interaction {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            text: String::new(),
            argument_text: String::new(),
            slash_command: None,
            invoked_function: None,
            form_inputs: FormInputs::new(),
            parameters: ParameterBag::new(),
            conversation: Conversation::default(),
            requester: Requester::default(),
        }
    }
}

/// Reads submitted values by field name, whatever widget produced them.
///
/// Absent fields and widget kinds we do not understand read as `""`, so callers
/// never need to tell "missing" from "blank".
#[derive(Debug, Clone, Copy)]
pub struct ValueExtractor {
    timezone: Tz,
}

impl ValueExtractor {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn extract(&self, inputs: &FormInputs, field: &str) -> String {
        match inputs.get(field) {
            Some(FormInput::Text(values)) => values.first().cloned().unwrap_or_default(),
            Some(FormInput::Date { ms_since_epoch }) => Utc
                .timestamp_millis_opt(*ms_since_epoch)
                .single()
                .map(|utc| {
                    utc.with_timezone(&self.timezone)
                        .format("%Y-%m-%d")
                        .to_string()
                })
                .unwrap_or_default(),
            Some(FormInput::Time { hours, minutes }) => format!("{:02}:{:02}", hours, minutes),
            Some(FormInput::Unsupported) | None => String::new(),
        }
    }

    /// Extracts several fields at once, keeping the requested order.
    pub fn extract_all(&self, inputs: &FormInputs, fields: &[&str]) -> Vec<(String, String)> {
        fields
            .iter()
            .map(|field| (field.to_string(), self.extract(inputs, field)))
            .collect()
    }
}
