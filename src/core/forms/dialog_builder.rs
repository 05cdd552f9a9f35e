// Pure builders for every dialog and card the forms show. No I/O happens here:
// callers pass in whatever was fetched or computed, and each builder binds its
// button to the next step's identifier.

use super::dialog::{Action, Button, Card, DropdownItem, OnClick, Section, Widget};
use super::extraction::ExtractedRecord;
use super::form_schema::{
    FormSchema, FormVariant, RawField, StepId, WidgetKind, FORM_A_SCHEMA, NOTES_FIELD,
    PRICED_FIELDS, SUBTYPE_A_CHOICE, SUBTYPE_B_CHOICE, SUBTYPE_FIELD,
};
use super::form_values::ParameterBag;

pub const ABOUT_TEXT: &str = "AI Agent - Your assistant. Use /research for advanced questions, /form_a for one form, or /form_b for another.";

const WELCOME_ROOM_TEXT: &str =
    "Thank you for adding me to the room! I'm ready to assist. Just ask me a question.";
const WELCOME_DIRECT_TEXT: &str =
    "Hello! I am your personal AI assistant. How can I help you today?";

fn bold_line(label: &str, value: &str) -> Widget {
    Widget::paragraph(format!("<b>{}:</b> {}", label, value))
}

pub fn about_dialog() -> Card {
    let open = |text: &str, step: StepId| Button {
        text: text.to_string(),
        on_click: OnClick::Action(Action {
            function: step.identifier(),
            opens_dialog: true,
            parameters: ParameterBag::new(),
        }),
    };
    Card::single_section(
        Some("About the AI Agent"),
        vec![
            Widget::paragraph(ABOUT_TEXT),
            Widget::Buttons(vec![
                open("Open Form A", StepId::OpenFormA),
                open("Open Form B", StepId::OpenFormB),
            ]),
        ],
    )
}

/// Welcome card plus the plain-text fallback shown in notifications.
pub fn welcome_card(is_room: bool, image_url: &str, help_url: &str) -> (Card, String) {
    let text = if is_room {
        WELCOME_ROOM_TEXT
    } else {
        WELCOME_DIRECT_TEXT
    };
    let card = Card {
        title: Some("AI Assistant".to_string()),
        subtitle: Some(
            "An AI agent to help with your tasks. Use / to see available commands.".to_string(),
        ),
        image_url: Some(image_url.to_string()).filter(|u| !u.is_empty()),
        sections: vec![Section {
            header: None,
            widgets: vec![
                Widget::paragraph(text),
                Widget::Buttons(vec![Button {
                    text: "How to use me?".to_string(),
                    on_click: OnClick::OpenLink(help_url.to_string()),
                }]),
            ],
        }],
    };
    (card, text.to_string())
}

// ============================================================================
// FORM A
// ============================================================================

/// Entry dialog. The date picker defaults to `now_ms`; the dropdown lists
/// `people` in order.
pub fn form_a_entry(people: &[String], now_ms: i64) -> Card {
    let mut widgets: Vec<Widget> = FORM_A_SCHEMA
        .detail_fields
        .iter()
        .map(|field| match Widget::input(field, None) {
            Widget::DatePicker { name, label, .. } => Widget::DatePicker {
                name,
                label,
                default_ms: Some(now_ms),
            },
            Widget::Dropdown { name, label, .. } => Widget::Dropdown {
                name,
                label,
                items: people
                    .iter()
                    .map(|person| DropdownItem {
                        text: person.clone(),
                        value: person.clone(),
                        selected: false,
                    })
                    .collect(),
            },
            other => other,
        })
        .collect();
    widgets.push(Widget::action_button(
        "Next",
        StepId::ConfirmFormA.identifier(),
        true,
        ParameterBag::new(),
    ));
    Card::single_section(Some("Form A"), widgets)
}

/// Echoes the entered values and carries `carried` into the submit action.
pub fn form_a_confirmation(carried: &ParameterBag) -> Card {
    let mut widgets: Vec<Widget> = FORM_A_SCHEMA
        .summary
        .iter()
        .map(|(label, key)| bold_line(label, carried.get(key)))
        .collect();
    widgets.push(Widget::action_button(
        "Submit",
        StepId::SubmitFormA.identifier(),
        false,
        carried.clone(),
    ));
    Card::single_section(Some("Confirm Form A Data"), widgets)
}

// ============================================================================
// FORM B
// ============================================================================

pub fn form_b_entry() -> Card {
    let choice = |variant: FormVariant, value: &str, selected: bool| DropdownItem {
        text: variant.label().to_string(),
        value: value.to_string(),
        selected,
    };
    let widgets = vec![
        Widget::paragraph("<b>Choose a sub-type for Form B:</b>"),
        Widget::Dropdown {
            name: SUBTYPE_FIELD.to_string(),
            label: "Sub-type".to_string(),
            items: vec![
                choice(FormVariant::SubtypeA, SUBTYPE_A_CHOICE, true),
                choice(FormVariant::SubtypeB, SUBTYPE_B_CHOICE, false),
            ],
        },
        Widget::Divider,
        Widget::input(
            &RawField {
                name: NOTES_FIELD,
                label: "Paste notes from the client meeting",
                kind: WidgetKind::MultiLineText,
            },
            None,
        ),
        Widget::Divider,
        Widget::action_button(
            "Next (Fill Details)",
            StepId::RouteFormB.identifier(),
            true,
            ParameterBag::new(),
        ),
    ];
    Card::single_section(Some("Form B Generator (Step 1: Choice)"), widgets)
}

/// Step 2: notes carried forward unedited, then durations and pricing.
pub fn subtype_details(schema: &FormSchema, notes: &str) -> Card {
    let notes_field = RawField {
        name: NOTES_FIELD,
        label: "Notes (editable)",
        kind: WidgetKind::MultiLineText,
    };

    let mut widgets = vec![Widget::input(&notes_field, Some(notes)), Widget::Divider];
    widgets.push(Widget::paragraph(schema.duration_heading));
    widgets.extend(schema.duration_fields.iter().map(|f| Widget::input(f, None)));
    widgets.push(Widget::Divider);
    widgets.push(Widget::paragraph("<b>Pricing and Discount:</b>"));
    widgets.extend(schema.pricing_fields.iter().map(|f| Widget::input(f, None)));
    widgets.push(Widget::Divider);
    widgets.push(Widget::action_button(
        "Process with AI",
        StepId::Extract(schema.variant).identifier(),
        true,
        ParameterBag::new(),
    ));

    let header = format!("Details for {} (Step 2/4)", schema.variant.label());
    Card::single_section(Some(&header), widgets)
}

/// Step 3: editable card pre-filled with the extracted record. Absent keys
/// show up as blank inputs.
pub fn verification_card(schema: &FormSchema, record: &ExtractedRecord) -> Card {
    let prefilled = |field: &RawField| {
        let value = record.get(field.name).map(String::as_str).unwrap_or("");
        Widget::input(field, Some(value))
    };

    let mut widgets: Vec<Widget> = schema.review_fields.iter().map(prefilled).collect();
    widgets.push(Widget::Divider);
    widgets.extend(schema.pricing_fields.iter().map(prefilled));
    widgets.push(Widget::action_button(
        "Confirm Data",
        StepId::Confirm(schema.variant).identifier(),
        true,
        ParameterBag::new(),
    ));

    let title = format!("Verify Extracted Data ({})", schema.variant.label());
    Card::titled(&title, widgets)
}

/// Step 4: summary with after-discount prices; the button carries every
/// verified value to submission.
pub fn final_confirmation(schema: &FormSchema, carried: &ParameterBag) -> Card {
    let mut widgets: Vec<Widget> = schema
        .summary
        .iter()
        .map(|(label, key)| bold_line(label, carried.get(key)))
        .collect();
    widgets.push(Widget::Divider);
    widgets.extend(
        PRICED_FIELDS
            .iter()
            .map(|priced| bold_line(priced.summary_label, carried.get(priced.after))),
    );
    widgets.push(Widget::action_button(
        "Generate Document",
        StepId::Submit(schema.variant).identifier(),
        false,
        carried.clone(),
    ));

    let title = format!("Final Confirmation ({})", schema.variant.label());
    Card::titled(&title, widgets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forms::form_schema::{SUBTYPE_A_SCHEMA, SUBTYPE_B_SCHEMA};

    fn only_action(card: &Card) -> &Action {
        let actions = card.actions();
        assert_eq!(actions.len(), 1, "expected exactly one action");
        actions[0]
    }

    #[test]
    fn about_dialog_offers_both_forms() {
        let card = about_dialog();
        let functions: Vec<&str> = card.actions().iter().map(|a| a.function.as_str()).collect();
        assert_eq!(functions, vec!["openFormADialog", "openFormBDialog"]);
        assert!(card.actions().iter().all(|a| a.opens_dialog));
    }

    #[test]
    fn welcome_wording_depends_on_space_type() {
        let (_, room) = welcome_card(true, "", "https://help");
        let (card, direct) = welcome_card(false, "https://logo", "https://help");
        assert_ne!(room, direct);
        assert_eq!(card.image_url.as_deref(), Some("https://logo"));
        assert!(card.actions().is_empty());
    }

    #[test]
    fn form_a_entry_defaults_date_and_lists_people() {
        let card = form_a_entry(&["Anna".to_string(), "Piotr".to_string()], 42);
        let widgets = &card.sections[0].widgets;

        assert!(widgets.iter().any(|w| matches!(
            w,
            Widget::DatePicker { default_ms: Some(42), .. }
        )));
        let items = widgets
            .iter()
            .find_map(|w| match w {
                Widget::Dropdown { items, .. } => Some(items),
                _ => None,
            })
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(only_action(&card).function, "openConfirmationDialog");
    }

    #[test]
    fn form_a_confirmation_carries_every_value() {
        let carried = ParameterBag::new()
            .with("field1", "Acme")
            .with("space_name", "spaces/S");
        let card = form_a_confirmation(&carried);

        let action = only_action(&card);
        assert_eq!(action.function, "submitFormA");
        assert_eq!(action.parameters, carried);
    }

    #[test]
    fn form_b_entry_routes_to_step_two() {
        let card = form_b_entry();
        assert_eq!(only_action(&card).function, "routeFormBStep2");
        assert_eq!(card.input_names(), vec![SUBTYPE_FIELD, NOTES_FIELD]);
    }

    #[test]
    fn subtype_details_carry_notes_forward() {
        let card = subtype_details(&SUBTYPE_B_SCHEMA, "met with Acme");

        let notes = card.sections[0]
            .widgets
            .iter()
            .find_map(|w| match w {
                Widget::TextInput { name, value, .. } if name == NOTES_FIELD => value.clone(),
                _ => None,
            });
        assert_eq!(notes.as_deref(), Some("met with Acme"));
        assert_eq!(only_action(&card).function, "subtypeB.extract");
        assert!(card.input_names().contains(&"time_field_A"));
    }

    #[test]
    fn verification_prefills_known_keys_and_blanks_the_rest() {
        let mut record = ExtractedRecord::new();
        record.insert("client_name".to_string(), "Acme".to_string());
        let card = verification_card(&SUBTYPE_A_SCHEMA, &record);

        let value_of = |field: &str| {
            card.sections[0].widgets.iter().find_map(|w| match w {
                Widget::TextInput { name, value, .. } if name == field => value.clone(),
                _ => None,
            })
        };
        assert_eq!(value_of("client_name").as_deref(), Some("Acme"));
        assert_eq!(value_of("project_title").as_deref(), Some(""));
        assert_eq!(only_action(&card).function, "subtypeA.confirm");
        assert_eq!(card.title.as_deref(), Some("Verify Extracted Data (Sub-type A)"));
    }

    #[test]
    fn final_confirmation_shows_after_discount_prices() {
        let carried = ParameterBag::new()
            .with("client_name", "Acme")
            .with("price_phase1_after", "900,00")
            .with("price_phase2_after", "N/A");
        let card = final_confirmation(&SUBTYPE_B_SCHEMA, &carried);

        let texts: Vec<&str> = card.sections[0]
            .widgets
            .iter()
            .filter_map(|w| match w {
                Widget::Paragraph(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(texts.contains(&"<b>Client:</b> Acme"));
        assert!(texts.contains(&"<b>Phase 1 Price (after discount):</b> 900,00"));
        assert!(texts.contains(&"<b>Phase 2 Price (after discount):</b> N/A"));

        let action = only_action(&card);
        assert_eq!(action.function, "subtypeB.submit");
        assert_eq!(action.parameters, carried);
    }
}
