// Static description of every form variant: the fields each step shows, what
// the AI is asked to extract, and the invoked-function identifiers that link
// the steps together.

/// Dropdown value that selects Sub-type B in the Form B entry dialog.
pub const SUBTYPE_B_CHOICE: &str = "SUB_B";
pub const SUBTYPE_A_CHOICE: &str = "SUB_A";

pub const NOTES_FIELD: &str = "notes";
pub const SUBTYPE_FIELD: &str = "form_b_subtype";
pub const DISCOUNT_FIELD: &str = "discount";
pub const SPACE_PARAM: &str = "space_name";
pub const THREAD_PARAM: &str = "thread_name";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    SingleLineText,
    MultiLineText,
    Date,
    Time,
    Dropdown,
}

/// One input in a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: WidgetKind,
}

const fn text(name: &'static str, label: &'static str) -> RawField {
    RawField {
        name,
        label,
        kind: WidgetKind::SingleLineText,
    }
}

const fn multiline(name: &'static str, label: &'static str) -> RawField {
    RawField {
        name,
        label,
        kind: WidgetKind::MultiLineText,
    }
}

/// A net price field and the key its after-discount value is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedField {
    pub before: &'static str,
    pub after: &'static str,
    pub summary_label: &'static str,
}

pub const PRICED_FIELDS: [PricedField; 2] = [
    PricedField {
        before: "price_phase1_before",
        after: "price_phase1_after",
        summary_label: "Phase 1 Price (after discount)",
    },
    PricedField {
        before: "price_phase2_before",
        after: "price_phase2_after",
        summary_label: "Phase 2 Price (after discount)",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormVariant {
    FormA,
    SubtypeA,
    SubtypeB,
}

impl FormVariant {
    pub const FORM_B_SUBTYPES: [FormVariant; 2] = [FormVariant::SubtypeA, FormVariant::SubtypeB];

    /// Prefix used in variant-qualified function identifiers.
    pub fn key(&self) -> &'static str {
        match self {
            FormVariant::FormA => "formA",
            FormVariant::SubtypeA => "subtypeA",
            FormVariant::SubtypeB => "subtypeB",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormVariant::FormA => "Form A",
            FormVariant::SubtypeA => "Sub-type A",
            FormVariant::SubtypeB => "Sub-type B",
        }
    }

    /// The Form B branch for a dropdown value. Anything but Sub-type B's
    /// sentinel, including a blank value, selects Sub-type A.
    pub fn from_subtype_choice(choice: &str) -> FormVariant {
        if choice == SUBTYPE_B_CHOICE {
            FormVariant::SubtypeB
        } else {
            FormVariant::SubtypeA
        }
    }

    pub fn schema(&self) -> &'static FormSchema {
        match self {
            FormVariant::FormA => &FORM_A_SCHEMA,
            FormVariant::SubtypeA => &SUBTYPE_A_SCHEMA,
            FormVariant::SubtypeB => &SUBTYPE_B_SCHEMA,
        }
    }
}

/// Step handlers a card button can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepId {
    OpenFormA,
    ConfirmFormA,
    SubmitFormA,
    OpenFormB,
    RouteFormB,
    Extract(FormVariant),
    Confirm(FormVariant),
    Submit(FormVariant),
}

impl StepId {
    pub fn identifier(&self) -> String {
        match self {
            StepId::OpenFormA => "openFormADialog".to_string(),
            StepId::ConfirmFormA => "openConfirmationDialog".to_string(),
            StepId::SubmitFormA => "submitFormA".to_string(),
            StepId::OpenFormB => "openFormBDialog".to_string(),
            StepId::RouteFormB => "routeFormBStep2".to_string(),
            StepId::Extract(v) => format!("{}.extract", v.key()),
            StepId::Confirm(v) => format!("{}.confirm", v.key()),
            StepId::Submit(v) => format!("{}.submit", v.key()),
        }
    }

    /// Exact-match lookup; unknown identifiers (and prefixes of known ones)
    /// resolve to `None`.
    pub fn parse(identifier: &str) -> Option<StepId> {
        match identifier {
            "openFormADialog" => return Some(StepId::OpenFormA),
            "openConfirmationDialog" => return Some(StepId::ConfirmFormA),
            "submitFormA" => return Some(StepId::SubmitFormA),
            "openFormBDialog" => return Some(StepId::OpenFormB),
            "routeFormBStep2" => return Some(StepId::RouteFormB),
            _ => {}
        }

        let (prefix, step) = identifier.split_once('.')?;
        let variant = FormVariant::FORM_B_SUBTYPES
            .into_iter()
            .find(|v| v.key() == prefix)?;
        match step {
            "extract" => Some(StepId::Extract(variant)),
            "confirm" => Some(StepId::Confirm(variant)),
            "submit" => Some(StepId::Submit(variant)),
            _ => None,
        }
    }
}

/// What the AI is asked to pull out of the meeting notes.
#[derive(Debug)]
pub struct ExtractionSchema {
    /// Document name used in the instruction ("Sub-type A document").
    pub document_kind: &'static str,
    /// Raw duration inputs quoted verbatim in the prompt.
    pub prompt_duration_fields: &'static [&'static str],
    /// Expected keys with their description for the model.
    pub expected_keys: &'static [(&'static str, &'static str)],
    /// AI-produced keys that are re-normalized as durations.
    pub normalized_durations: &'static [&'static str],
    /// Keys computed locally by summing raw duration inputs.
    pub derived_durations: &'static [(&'static str, &'static [&'static str])],
}

#[derive(Debug)]
pub struct FormSchema {
    pub variant: FormVariant,
    /// Inputs of the entry (Form A) or details (Form B) step, after notes.
    pub detail_fields: &'static [RawField],
    /// Header shown above the duration inputs.
    pub duration_heading: &'static str,
    pub duration_fields: &'static [RawField],
    pub pricing_fields: &'static [RawField],
    pub extraction: Option<ExtractionSchema>,
    /// Editable fields on the verification card.
    pub review_fields: &'static [RawField],
    /// Label/key pairs echoed on the final confirmation.
    pub summary: &'static [(&'static str, &'static str)],
}

impl FormSchema {
    /// Every key the confirmation step reads and forwards to submission.
    pub fn confirmed_keys(&self) -> Vec<&'static str> {
        self.review_fields
            .iter()
            .chain(self.pricing_fields.iter())
            .map(|f| f.name)
            .collect()
    }
}

pub static FORM_A_SCHEMA: FormSchema = FormSchema {
    variant: FormVariant::FormA,
    detail_fields: &[
        text("field1", "Field 1 (e.g., Company)"),
        text("field2", "Field 2 (e.g., Location)"),
        RawField {
            name: "date1",
            label: "Date 1",
            kind: WidgetKind::Date,
        },
        RawField {
            name: "time1",
            label: "Time 1",
            kind: WidgetKind::Time,
        },
        RawField {
            name: "dropdown1",
            label: "Dropdown 1",
            kind: WidgetKind::Dropdown,
        },
    ],
    duration_heading: "",
    duration_fields: &[],
    pricing_fields: &[],
    extraction: None,
    review_fields: &[],
    summary: &[
        ("Field 1", "field1"),
        ("Field 2", "field2"),
        ("Date 1", "date1"),
        ("Time 1", "time1"),
        ("Dropdown 1", "dropdown1"),
    ],
};

pub static SUBTYPE_A_SCHEMA: FormSchema = FormSchema {
    variant: FormVariant::SubtypeA,
    detail_fields: &[],
    duration_heading: "<b>Time Data (Sub-type A):</b>",
    duration_fields: &[
        text("time_field_1", "Time for Task 1 (e.g., 2+4)"),
        text("time_field_2", "Time for Task 2 (e.g., 1 day)"),
    ],
    pricing_fields: &[
        text("price_phase1_before", "Price Phase 1 (Net)"),
        text("price_phase2_before", "Price Phase 2 (Net)"),
        text(DISCOUNT_FIELD, "Discount (%)"),
    ],
    extraction: Some(ExtractionSchema {
        document_kind: "Sub-type A",
        prompt_duration_fields: &["time_field_1", "time_field_2"],
        expected_keys: &[
            ("client_name", "The name of the client."),
            ("project_title", "A title for the project."),
            (
                "situation_summary",
                "A professional summary of the client's situation.",
            ),
            ("project_goals", "The goals of the project."),
            ("phase1_description", "Description of the first phase."),
            ("phase1_time", "Standardized time for the first phase."),
            ("phase2_description", "Description of the second phase."),
            ("phase2_time", "Standardized time for the second phase."),
        ],
        normalized_durations: &["phase1_time", "phase2_time"],
        derived_durations: &[],
    }),
    review_fields: &[
        text("client_name", "Client Name"),
        text("project_title", "Project Title"),
        multiline("situation_summary", "Situation Summary"),
        multiline("project_goals", "Project Goals"),
        multiline("phase1_description", "Phase 1 Description"),
        text("phase1_time", "Phase 1 Time"),
        multiline("phase2_description", "Phase 2 Description"),
        text("phase2_time", "Phase 2 Time"),
    ],
    summary: &[("Client", "client_name"), ("Project", "project_title")],
};

pub static SUBTYPE_B_SCHEMA: FormSchema = FormSchema {
    variant: FormVariant::SubtypeB,
    detail_fields: &[],
    duration_heading: "<b>Time Data (Sub-type B):</b>",
    duration_fields: &[
        text("time_field_A", "Time for Activity A (e.g., 2+4)"),
        text("time_field_B", "Time for Activity B (e.g., 1 day)"),
    ],
    pricing_fields: &[
        text("price_phase1_before", "Price Phase 1 (Net)"),
        text("price_phase2_before", "Price Phase 2 (Net/month)"),
        text(DISCOUNT_FIELD, "Discount (%)"),
    ],
    extraction: Some(ExtractionSchema {
        document_kind: "Sub-type B",
        prompt_duration_fields: &[],
        expected_keys: &[
            ("client_name", "The name of the client."),
            (
                "situation_summary",
                "A professional summary of the client's situation in bullet points (use \\n).",
            ),
            (
                "project_goals",
                "The goals of the project in bullet points (use \\n).",
            ),
        ],
        normalized_durations: &[],
        derived_durations: &[
            ("time_A", &["time_field_A"]),
            ("time_B", &["time_field_B"]),
            ("total_time_phase1", &["time_field_A", "time_field_B"]),
        ],
    }),
    review_fields: &[
        text("client_name", "Client Name"),
        multiline("situation_summary", "Situation Summary"),
        multiline("project_goals", "Project Goals"),
        text("time_A", "Time Activity A"),
        text("time_B", "Time Activity B"),
        text("total_time_phase1", "Total Time Phase 1"),
    ],
    summary: &[("Client", "client_name")],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_round_trip_through_parse() {
        let mut steps = vec![
            StepId::OpenFormA,
            StepId::ConfirmFormA,
            StepId::SubmitFormA,
            StepId::OpenFormB,
            StepId::RouteFormB,
        ];
        for variant in FormVariant::FORM_B_SUBTYPES {
            steps.push(StepId::Extract(variant));
            steps.push(StepId::Confirm(variant));
            steps.push(StepId::Submit(variant));
        }

        for step in steps {
            assert_eq!(StepId::parse(&step.identifier()), Some(step));
        }
    }

    #[test]
    fn variant_qualified_identifiers_do_not_collide() {
        assert_ne!(
            StepId::Confirm(FormVariant::SubtypeA).identifier(),
            StepId::Confirm(FormVariant::SubtypeB).identifier()
        );
    }

    #[test]
    fn parse_requires_exact_match() {
        assert_eq!(StepId::parse("subtypeA"), None);
        assert_eq!(StepId::parse("subtypeA.extract.extra"), None);
        assert_eq!(StepId::parse("subtypeA.ext"), None);
        assert_eq!(StepId::parse("submitForm"), None);
        assert_eq!(StepId::parse("formA.submit"), None);
        assert_eq!(StepId::parse(""), None);
    }

    #[test]
    fn subtype_choice_defaults_to_a() {
        assert_eq!(
            FormVariant::from_subtype_choice(SUBTYPE_B_CHOICE),
            FormVariant::SubtypeB
        );
        assert_eq!(
            FormVariant::from_subtype_choice(SUBTYPE_A_CHOICE),
            FormVariant::SubtypeA
        );
        assert_eq!(FormVariant::from_subtype_choice(""), FormVariant::SubtypeA);
        assert_eq!(
            FormVariant::from_subtype_choice("sub_b"),
            FormVariant::SubtypeA
        );
    }

    #[test]
    fn confirmed_keys_cover_review_and_pricing_fields() {
        let keys = SUBTYPE_B_SCHEMA.confirmed_keys();
        assert!(keys.contains(&"total_time_phase1"));
        assert!(keys.contains(&DISCOUNT_FIELD));
        for priced in PRICED_FIELDS {
            assert!(keys.contains(&priced.before));
        }
    }
}
