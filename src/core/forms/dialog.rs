// Platform-agnostic description of what the bot sends back: dialogs, cards and
// plain replies. The chat layer renders these into the wire format.

use super::form_values::ParameterBag;
use super::form_schema::{RawField, WidgetKind};

#[derive(Debug, Clone, PartialEq)]
pub struct DropdownItem {
    pub text: String,
    pub value: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Invoked function identifier the router resolves on click.
    pub function: String,
    /// Whether the click should open (or continue) a dialog.
    pub opens_dialog: bool,
    pub parameters: ParameterBag,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OnClick {
    Action(Action),
    OpenLink(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub text: String,
    pub on_click: OnClick,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    TextInput {
        name: String,
        label: String,
        multiline: bool,
        value: Option<String>,
    },
    DatePicker {
        name: String,
        label: String,
        default_ms: Option<i64>,
    },
    TimePicker {
        name: String,
        label: String,
    },
    Dropdown {
        name: String,
        label: String,
        items: Vec<DropdownItem>,
    },
    Paragraph(String),
    Divider,
    Buttons(Vec<Button>),
}

impl Widget {
    /// Input widget for a schema field, pre-filled with `value` when given.
    pub fn input(field: &RawField, value: Option<&str>) -> Widget {
        let value = value.map(str::to_string);
        match field.kind {
            WidgetKind::SingleLineText | WidgetKind::MultiLineText => Widget::TextInput {
                name: field.name.to_string(),
                label: field.label.to_string(),
                multiline: field.kind == WidgetKind::MultiLineText,
                value,
            },
            WidgetKind::Date => Widget::DatePicker {
                name: field.name.to_string(),
                label: field.label.to_string(),
                default_ms: None,
            },
            WidgetKind::Time => Widget::TimePicker {
                name: field.name.to_string(),
                label: field.label.to_string(),
            },
            WidgetKind::Dropdown => Widget::Dropdown {
                name: field.name.to_string(),
                label: field.label.to_string(),
                items: Vec::new(),
            },
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Widget {
        Widget::Paragraph(text.into())
    }

    /// A single button that fires `function` with the given parameters.
    pub fn action_button(
        text: impl Into<String>,
        function: impl Into<String>,
        opens_dialog: bool,
        parameters: ParameterBag,
    ) -> Widget {
        Widget::Buttons(vec![Button {
            text: text.into(),
            on_click: OnClick::Action(Action {
                function: function.into(),
                opens_dialog,
                parameters,
            }),
        }])
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    pub header: Option<String>,
    pub widgets: Vec<Widget>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Card {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub sections: Vec<Section>,
}

impl Card {
    pub fn single_section(header: Option<&str>, widgets: Vec<Widget>) -> Card {
        Card {
            sections: vec![Section {
                header: header.map(str::to_string),
                widgets,
            }],
            ..Card::default()
        }
    }

    pub fn titled(title: &str, widgets: Vec<Widget>) -> Card {
        Card {
            title: Some(title.to_string()),
            sections: vec![Section {
                header: None,
                widgets,
            }],
            ..Card::default()
        }
    }

    /// Every action bound anywhere in the card, in order.
    #[cfg(test)]
    pub fn actions(&self) -> Vec<&Action> {
        self.sections
            .iter()
            .flat_map(|s| s.widgets.iter())
            .filter_map(|w| match w {
                Widget::Buttons(buttons) => Some(buttons.iter()),
                _ => None,
            })
            .flatten()
            .filter_map(|b| match &b.on_click {
                OnClick::Action(action) => Some(action),
                OnClick::OpenLink(_) => None,
            })
            .collect()
    }

    /// Names of all input widgets, in order.
    #[cfg(test)]
    pub fn input_names(&self) -> Vec<&str> {
        self.sections
            .iter()
            .flat_map(|s| s.widgets.iter())
            .filter_map(|w| match w {
                Widget::TextInput { name, .. }
                | Widget::DatePicker { name, .. }
                | Widget::TimePicker { name, .. }
                | Widget::Dropdown { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// The synchronous answer to one inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Nothing to say; rendered as an empty body.
    Empty,
    /// A bare text reply.
    Text(String),
    /// Open or replace a dialog.
    Dialog(Card),
    /// Post a new message (usually an acknowledgement of background work).
    NewMessage(String),
    /// A plain message with a card attached.
    CardMessage { card: Card, text: String },
}
