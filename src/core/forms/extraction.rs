// Turns meeting notes into a structured record with the fast AI tier.
//
// Extraction never fails from the caller's point of view: a model error, a
// reply without a JSON object, or a malformed object all yield an empty
// record, and the user just sees blank fields on the verification card.

use super::form_schema::FormSchema;
use super::form_values::ParameterBag;
use super::time_span::sum_time_fields;
use crate::core::ai::{AiProvider, AiService, GenerationMode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, warn};

/// String keys to string values; absent keys read as blank downstream.
pub type ExtractedRecord = BTreeMap<String, String>;

/// The first balanced `{...}` region of `text`, ignoring braces inside JSON
/// strings. `None` when there is no `{` or it is never closed.
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parses the model's reply into a record. Non-object JSON counts as malformed.
pub fn parse_record(reply: &str) -> Option<ExtractedRecord> {
    let region = first_json_object(reply)?;
    match serde_json::from_str::<serde_json::Map<String, Value>>(region) {
        Ok(map) => Some(
            map.into_iter()
                .map(|(key, value)| (key, value_to_text(value)))
                .collect(),
        ),
        Err(e) => {
            warn!("AI reply contained malformed JSON: {}", e);
            None
        }
    }
}

pub fn build_prompt(schema: &FormSchema, notes: &str, raw_inputs: &ParameterBag) -> String {
    let Some(extraction) = &schema.extraction else {
        return String::new();
    };

    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are an AI assistant. Your task is to process raw notes and convert them\n\
         into a structured JSON object for generating a \"{}\" document.\n",
        extraction.document_kind
    );
    let _ = writeln!(prompt, "RAW NOTES:\n\"\"\"{}\"\"\"\n", notes);

    if !extraction.prompt_duration_fields.is_empty() {
        prompt.push_str("RAW TIME INPUTS:\n");
        for field in extraction.prompt_duration_fields {
            let _ = writeln!(prompt, "{}=\"{}\"", field, raw_inputs.get(field));
        }
        prompt.push('\n');
    }

    prompt.push_str("EXPECTED JSON STRUCTURE:\n");
    for (key, description) in extraction.expected_keys {
        let _ = writeln!(prompt, "- \"{}\": {}", key, description);
    }
    prompt.push_str("\nReturn ONLY the JSON object.");
    prompt
}

/// Normalizes and derives durations, then overlays the user's pricing inputs.
pub fn post_process(
    schema: &FormSchema,
    mut record: ExtractedRecord,
    raw_inputs: &ParameterBag,
) -> ExtractedRecord {
    if let Some(extraction) = &schema.extraction {
        for key in extraction.normalized_durations {
            if let Some(raw) = record.get(*key) {
                let normalized = sum_time_fields(&[raw.as_str()]);
                record.insert(key.to_string(), normalized);
            }
        }
        for (key, sources) in extraction.derived_durations {
            let raw: Vec<&str> = sources.iter().map(|s| raw_inputs.get(s)).collect();
            record.insert(key.to_string(), sum_time_fields(&raw));
        }
    }

    for field in schema.pricing_fields {
        let value = raw_inputs.get(field.name).trim().to_string();
        record.insert(field.name.to_string(), value);
    }
    record
}

pub struct ExtractionPipeline<P: AiProvider> {
    ai: Arc<AiService<P>>,
}

impl<P: AiProvider> ExtractionPipeline<P> {
    pub fn new(ai: Arc<AiService<P>>) -> Self {
        Self { ai }
    }

    /// Runs the AI with the variant's instruction and merges the result with
    /// the raw step-2 inputs.
    pub async fn extract(
        &self,
        schema: &FormSchema,
        notes: &str,
        raw_inputs: &ParameterBag,
    ) -> ExtractedRecord {
        let prompt = build_prompt(schema, notes, raw_inputs);
        let record = match self.ai.generate(&prompt, GenerationMode::Fast).await {
            Ok(reply) => parse_record(&reply).unwrap_or_else(|| {
                warn!(variant = schema.variant.key(), "No usable JSON in AI reply");
                ExtractedRecord::new()
            }),
            Err(e) => {
                warn!(variant = schema.variant.key(), "AI extraction failed: {}", e);
                ExtractedRecord::new()
            }
        };
        debug!(keys = record.len(), "Extracted record");

        post_process(schema, record, raw_inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ai::{AiConfig, ModeProfile};
    use crate::core::forms::form_schema::{SUBTYPE_A_SCHEMA, SUBTYPE_B_SCHEMA};
    use crate::core::test_support::ScriptedAi;

    fn pipeline(ai: ScriptedAi) -> ExtractionPipeline<ScriptedAi> {
        let profile = |model: &str| ModeProfile {
            config: AiConfig::for_model(model),
            system_instruction: String::new(),
        };
        ExtractionPipeline::new(Arc::new(AiService::new(
            ai,
            profile("fast"),
            profile("research"),
        )))
    }

    #[test]
    fn finds_first_balanced_object() {
        assert_eq!(
            first_json_object("noise {\"a\":{\"b\":1}} tail {\"c\":2}"),
            Some("{\"a\":{\"b\":1}}")
        );
        assert_eq!(
            first_json_object("x {\"a\":\"}{\"} y"),
            Some("{\"a\":\"}{\"}")
        );
        assert_eq!(first_json_object("no braces"), None);
        assert_eq!(first_json_object("{\"open\": 1"), None);
    }

    #[test]
    fn parse_record_keeps_only_present_keys() {
        let record = parse_record("noise {\"client_name\":\"Acme\"} trailing").unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("client_name").map(String::as_str), Some("Acme"));
    }

    #[test]
    fn parse_record_stringifies_non_string_values() {
        let record = parse_record("{\"a\": 3, \"b\": null, \"c\": true}").unwrap();
        assert_eq!(record["a"], "3");
        assert_eq!(record["b"], "");
        assert_eq!(record["c"], "true");
    }

    #[test]
    fn malformed_or_non_object_json_is_rejected() {
        assert_eq!(parse_record("{client_name: Acme}"), None);
        assert_eq!(parse_record("[1, 2]"), None);
    }

    #[test]
    fn prompt_quotes_notes_and_raw_durations() {
        let raw = ParameterBag::new().with("time_field_1", "2+4");
        let prompt = build_prompt(&SUBTYPE_A_SCHEMA, "met Acme", &raw);

        assert!(prompt.contains("\"\"\"met Acme\"\"\""));
        assert!(prompt.contains("time_field_1=\"2+4\""));
        assert!(prompt.contains("- \"phase2_time\":"));
        assert!(prompt.ends_with("Return ONLY the JSON object."));
    }

    #[test]
    fn subtype_b_prompt_has_no_raw_time_section() {
        let prompt = build_prompt(&SUBTYPE_B_SCHEMA, "notes", &ParameterBag::new());
        assert!(!prompt.contains("RAW TIME INPUTS"));
        assert!(prompt.contains("\"Sub-type B\""));
    }

    #[tokio::test]
    async fn extract_takes_json_from_noisy_reply() {
        let ai = ScriptedAi::replying("Sure! {\"client_name\":\"Acme\"} Hope it helps.");
        let record = pipeline(ai.clone())
            .extract(&SUBTYPE_A_SCHEMA, "notes", &ParameterBag::new())
            .await;

        assert_eq!(record.get("client_name").map(String::as_str), Some("Acme"));
        assert!(record.get("project_title").is_none());
        assert_eq!(ai.calls()[0].1, "fast");
    }

    #[tokio::test]
    async fn subtype_a_normalizes_ai_durations() {
        let ai = ScriptedAi::replying("{\"phase1_time\":\"2+4\",\"phase2_time\":\"1d\"}");
        let record = pipeline(ai)
            .extract(&SUBTYPE_A_SCHEMA, "notes", &ParameterBag::new())
            .await;

        assert_eq!(record["phase1_time"], "2 dni + 4 godzin");
        assert_eq!(record["phase2_time"], "1 dzień");
    }

    #[tokio::test]
    async fn subtype_b_derives_durations_from_raw_inputs() {
        let raw = ParameterBag::new()
            .with("time_field_A", "2 dni")
            .with("time_field_B", "1+3")
            .with("price_phase1_before", " 1000 ")
            .with("discount", "10");
        let record = pipeline(ScriptedAi::replying("{}"))
            .extract(&SUBTYPE_B_SCHEMA, "notes", &raw)
            .await;

        assert_eq!(record["time_A"], "2 dni");
        assert_eq!(record["time_B"], "1 dzień + 3 godzin");
        assert_eq!(record["total_time_phase1"], "3 dni + 3 godzin");
        assert_eq!(record["price_phase1_before"], "1000");
        assert_eq!(record["price_phase2_before"], "");
        assert_eq!(record["discount"], "10");
    }

    #[tokio::test]
    async fn ai_failure_yields_blank_record_with_user_inputs() {
        let raw = ParameterBag::new().with("discount", "5");
        let record = pipeline(ScriptedAi::failing())
            .extract(&SUBTYPE_A_SCHEMA, "notes", &raw)
            .await;

        assert!(record.get("client_name").is_none());
        assert_eq!(record["discount"], "5");
    }
}
