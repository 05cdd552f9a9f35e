// Renders `Reply` and `Card` values into Google Chat's JSON (cards v2).

use crate::core::forms::{Button, Card, OnClick, Reply, Section, Widget};
use chrono::Utc;
use serde_json::{json, Map, Value};

pub const WELCOME_CARD_ID: &str = "welcomeCard";
pub const INTERACTIVE_CARD_ID: &str = "interactiveCard";

fn render_button(button: &Button) -> Value {
    let on_click = match &button.on_click {
        OnClick::OpenLink(url) => json!({ "openLink": { "url": url } }),
        OnClick::Action(action) => {
            let parameters: Vec<Value> = action
                .parameters
                .iter()
                .map(|(key, value)| json!({ "key": key, "value": value }))
                .collect();
            let mut body = json!({
                "function": action.function,
                "parameters": parameters,
            });
            if action.opens_dialog {
                body["interaction"] = json!("OPEN_DIALOG");
            }
            json!({ "action": body })
        }
    };
    json!({ "text": button.text, "onClick": on_click })
}

pub fn render_widget(widget: &Widget) -> Value {
    match widget {
        Widget::TextInput {
            name,
            label,
            multiline,
            value,
        } => {
            let mut input = json!({
                "name": name,
                "label": label,
                "type": if *multiline { "MULTIPLE_LINE" } else { "SINGLE_LINE" },
            });
            if let Some(value) = value {
                input["value"] = json!(value);
            }
            json!({ "textInput": input })
        }
        Widget::DatePicker {
            name,
            label,
            default_ms,
        } => {
            let mut picker = json!({ "name": name, "label": label, "type": "DATE_ONLY" });
            if let Some(ms) = default_ms {
                picker["valueMsEpoch"] = json!(ms.to_string());
            }
            json!({ "dateTimePicker": picker })
        }
        Widget::TimePicker { name, label } => json!({
            "dateTimePicker": { "name": name, "label": label, "type": "TIME_ONLY" }
        }),
        Widget::Dropdown { name, label, items } => {
            let items: Vec<Value> = items
                .iter()
                .map(|item| {
                    json!({ "text": item.text, "value": item.value, "selected": item.selected })
                })
                .collect();
            json!({
                "selectionInput": {
                    "name": name,
                    "label": label,
                    "type": "DROPDOWN",
                    "items": items,
                }
            })
        }
        Widget::Paragraph(text) => json!({ "textParagraph": { "text": text } }),
        Widget::Divider => json!({ "divider": {} }),
        Widget::Buttons(buttons) => json!({
            "buttonList": { "buttons": buttons.iter().map(render_button).collect::<Vec<_>>() }
        }),
    }
}

fn render_section(section: &Section) -> Value {
    let mut body = json!({
        "widgets": section.widgets.iter().map(render_widget).collect::<Vec<_>>(),
    });
    if let Some(header) = &section.header {
        body["header"] = json!(header);
    }
    body
}

/// The card body shared by dialogs and messages.
pub fn render_card(card: &Card) -> Value {
    let mut body = Map::new();
    if card.title.is_some() || card.subtitle.is_some() || card.image_url.is_some() {
        let mut header = Map::new();
        if let Some(title) = &card.title {
            header.insert("title".to_string(), json!(title));
        }
        if let Some(subtitle) = &card.subtitle {
            header.insert("subtitle".to_string(), json!(subtitle));
        }
        if let Some(url) = &card.image_url {
            header.insert("imageUrl".to_string(), json!(url));
            header.insert("imageType".to_string(), json!("CIRCLE"));
        }
        body.insert("header".to_string(), Value::Object(header));
    }
    body.insert(
        "sections".to_string(),
        Value::Array(card.sections.iter().map(render_section).collect()),
    );
    Value::Object(body)
}

/// `cardsV2` entry with a unique card id.
pub fn render_card_v2(card_id: &str, card: &Card) -> Value {
    json!([{ "cardId": card_id, "card": render_card(card) }])
}

fn unique_card_id() -> String {
    format!("{}-{}", INTERACTIVE_CARD_ID, Utc::now().timestamp_millis())
}

/// Response body for one handled event. `Reply::Empty` renders as `{}`.
pub fn render_reply(reply: &Reply) -> Value {
    match reply {
        Reply::Empty => json!({}),
        Reply::Text(text) => json!({ "text": text }),
        Reply::Dialog(card) => json!({
            "actionResponse": {
                "type": "DIALOG",
                "dialogAction": { "dialog": { "body": render_card(card) } }
            }
        }),
        Reply::NewMessage(text) => json!({
            "actionResponse": { "type": "NEW_MESSAGE" },
            "text": text,
        }),
        Reply::CardMessage { card, text } => json!({
            "cardsV2": render_card_v2(WELCOME_CARD_ID, card),
            "text": text,
        }),
    }
}

/// Body for an outbound `spaces.messages.create` call.
pub fn render_outbound_message(text: &str, thread: Option<&str>, card: Option<&Card>) -> Value {
    let mut body = json!({ "text": text });
    if let Some(thread) = thread {
        body["thread"] = json!({ "name": thread });
    }
    if let Some(card) = card {
        body["cardsV2"] = render_card_v2(&unique_card_id(), card);
    }
    body
}
