//! Best-effort decoding of generative-model output into fixed-shape records.
//!
//! Every validator accepts any JSON value and always returns a complete
//! record: well-typed, non-empty values are kept, everything else is replaced
//! by the documented default. Nothing here returns an error.

use serde_json::{Map, Value};

use crate::config::SentimentLabels;
use crate::error::CollaboratorError;
use crate::models::{
    Assessment, MedicalSummary, Objective, Plan, SentimentIntent, SoapNote, Subjective,
    NOT_DOCUMENTED, UNKNOWN, UNKNOWN_INTENT,
};

/// Remove a surrounding Markdown code fence (```` ```json ... ``` ````).
///
/// A language tag on the opening fence line is dropped along with the fence.
/// Either fence may be missing.
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        // A closing fence without an opening one
        return trimmed.strip_suffix("```").unwrap_or(trimmed).trim();
    };

    let inner = rest.split("```").next().unwrap_or(rest);
    let inner = match inner.split_once('\n') {
        Some((tag, body)) if is_language_tag(tag) => body,
        _ => inner
            .strip_prefix("json")
            .or_else(|| inner.strip_prefix("JSON"))
            .unwrap_or(inner),
    };

    inner.trim()
}

fn is_language_tag(line: &str) -> bool {
    let line = line.trim();
    line.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Parse a model response as a single JSON object
pub fn parse_json_object(response: &str) -> Result<Value, CollaboratorError> {
    let body = strip_code_fence(response);
    let value: Value =
        serde_json::from_str(body).map_err(|e| CollaboratorError::Parse(e.to_string()))?;

    if value.is_object() {
        Ok(value)
    } else {
        Err(CollaboratorError::Parse(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Look up a field by its canonical key, falling back to the snake_case spelling
fn field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object
        .get(key)
        .or_else(|| object.get(&key.to_lowercase().replace('-', "_")))
}

/// A non-blank string value
fn text_value(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// The non-blank strings of a list; a lone string counts as a one-item list
fn list_value(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| text_value(Some(item)))
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Validate a candidate medical summary
pub fn validate_summary(candidate: &Value) -> MedicalSummary {
    let Some(object) = candidate.as_object() else {
        return MedicalSummary::default();
    };

    let text_or_unknown =
        |key: &str| text_value(field(object, key)).unwrap_or_else(|| UNKNOWN.to_string());

    // Several diagnoses are combined into one string
    let diagnosis = match field(object, "Diagnosis") {
        Some(Value::Array(_)) => {
            let parts = list_value(field(object, "Diagnosis"));
            if parts.is_empty() {
                UNKNOWN.to_string()
            } else {
                parts.join(", ")
            }
        }
        _ => text_or_unknown("Diagnosis"),
    };

    MedicalSummary {
        patient_name: text_or_unknown("Patient_Name"),
        symptoms: list_value(field(object, "Symptoms")),
        diagnosis,
        treatment: list_value(field(object, "Treatment")),
        current_status: text_or_unknown("Current_Status"),
        prognosis: text_or_unknown("Prognosis"),
    }
}

/// Canonical sentiment label for `value`, or the neutral label
pub fn canonical_sentiment<'a>(value: &str, labels: &'a SentimentLabels) -> &'a str {
    let value = value.trim();
    [&labels.anxious, &labels.neutral, &labels.reassured]
        .into_iter()
        .find(|label| label.eq_ignore_ascii_case(value))
        .map(String::as_str)
        .unwrap_or(labels.neutral.as_str())
}

/// Resolve free text against the closed intent vocabulary.
///
/// Tries an exact (case-insensitive) match, then the first label contained in
/// the text, then falls back to the first label.
pub fn resolve_intent<'a>(response: &str, intents: &'a [String]) -> &'a str {
    let response = response.trim();
    let lower = response.to_lowercase();

    intents
        .iter()
        .find(|label| label.eq_ignore_ascii_case(response))
        .or_else(|| {
            intents
                .iter()
                .find(|label| lower.contains(&label.to_lowercase()))
        })
        .or_else(|| intents.first())
        .map(String::as_str)
        .unwrap_or(UNKNOWN_INTENT)
}

/// Validate a candidate sentiment/intent record
pub fn validate_sentiment_intent(
    candidate: &Value,
    labels: &SentimentLabels,
    intents: &[String],
) -> SentimentIntent {
    let Some(object) = candidate.as_object() else {
        return SentimentIntent::default_for(labels);
    };

    let sentiment = match text_value(field(object, "Sentiment")) {
        Some(value) => canonical_sentiment(&value, labels).to_string(),
        None => labels.neutral.clone(),
    };

    let intent = text_value(field(object, "Intent")).unwrap_or_default();
    let intent = resolve_intent(&intent, intents).to_string();

    SentimentIntent { sentiment, intent }
}

/// Render a SOAP sub-field value as text, or `None` if it carries nothing
fn soap_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| soap_text(Some(item)))
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

fn soap_field(section: &Map<String, Value>, key: &str) -> String {
    soap_text(field(section, key)).unwrap_or_else(|| NOT_DOCUMENTED.to_string())
}

fn soap_section<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    field(object, key).and_then(Value::as_object)
}

/// Validate a candidate SOAP note.
///
/// A missing or non-object section is replaced whole; otherwise each of its
/// two sub-fields is checked on its own.
pub fn validate_soap(candidate: &Value) -> SoapNote {
    let Some(object) = candidate.as_object() else {
        return SoapNote::default();
    };

    let subjective = soap_section(object, "Subjective")
        .map(|s| Subjective {
            chief_complaint: soap_field(s, "Chief_Complaint"),
            history_of_present_illness: soap_field(s, "History_of_Present_Illness"),
        })
        .unwrap_or_default();

    let objective = soap_section(object, "Objective")
        .map(|s| Objective {
            physical_exam: soap_field(s, "Physical_Exam"),
            observations: soap_field(s, "Observations"),
        })
        .unwrap_or_default();

    let assessment = soap_section(object, "Assessment")
        .map(|s| Assessment {
            diagnosis: soap_field(s, "Diagnosis"),
            severity: soap_field(s, "Severity"),
        })
        .unwrap_or_default();

    let plan = soap_section(object, "Plan")
        .map(|s| Plan {
            treatment: soap_field(s, "Treatment"),
            follow_up: soap_field(s, "Follow-Up"),
        })
        .unwrap_or_default();

    SoapNote {
        subjective,
        objective,
        assessment,
        plan,
    }
}
