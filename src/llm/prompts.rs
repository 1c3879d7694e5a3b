use crate::config::TextLimits;
use crate::models::{Entity, SegmentMetadata};
use crate::text::truncate_chars;

/// Shared preamble for every generative prompt
pub const ROLE_PREAMBLE: &str = "You are a clinical documentation assistant working from a \
doctor-patient consultation transcript.";

/// Guidance for the default intent labels; labels not listed here are offered without a hint
const INTENT_HINTS: &[(&str, &str)] = &[
    ("Reporting symptoms", "describing what is wrong: symptoms, pain, discomfort"),
    ("Seeking reassurance", "worried about the condition, looking for comfort"),
    ("Expressing improvement", "feeling better, describing progress"),
    ("Asking questions", "asking about diagnosis, treatment or prognosis"),
    ("Neutral update", "general information with no particular goal"),
];

/// Build the medical-summary prompt
pub fn build_summary_prompt(transcript: &str, entities: &[Entity], limits: &TextLimits) -> String {
    let mut prompt = String::new();

    prompt.push_str(ROLE_PREAMBLE);
    prompt.push_str(" Extract a structured medical summary.\n\n");

    push_transcript(&mut prompt, transcript, limits);
    push_entities(&mut prompt, entities, limits, true);

    prompt.push_str("## Output\n");
    prompt.push_str("Reply with a single JSON object with exactly these keys:\n");
    prompt.push_str("```json\n");
    prompt.push_str(
        r#"{
  "Patient_Name": "patient name if mentioned, otherwise \"Unknown\"",
  "Symptoms": ["symptom", "..."],
  "Diagnosis": "primary diagnosis as one string",
  "Treatment": ["treatment or medication", "..."],
  "Current_Status": "the patient's current condition",
  "Prognosis": "expected outcome or recovery"
}"#,
    );
    prompt.push_str("\n```\n\n");

    prompt.push_str("## Rules\n");
    prompt.push_str("- Output only the JSON object, with no commentary.\n");
    prompt.push_str("- Diagnosis is a string, never an array. Combine several diagnoses into one string.\n");
    prompt.push_str("- Use \"Unknown\" for missing strings and [] for missing lists.\n");
    prompt.push_str("- Use the detected entities to improve accuracy.\n");

    prompt
}

/// Build the patient-intent prompt; the model answers with one label as plain text
pub fn build_intent_prompt(patient_utterances: &[String], intent_labels: &[String]) -> String {
    let mut prompt = String::new();

    prompt.push_str(ROLE_PREAMBLE);
    prompt.push_str(" Identify the patient's primary intent.\n\n");

    prompt.push_str("## Patient Statements\n");
    for (i, utterance) in patient_utterances.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, utterance));
    }
    prompt.push('\n');

    prompt.push_str("## Options\n");
    prompt.push_str("Choose exactly one of:\n");
    for label in intent_labels {
        match INTENT_HINTS.iter().find(|(name, _)| *name == label.as_str()) {
            Some((_, hint)) => prompt.push_str(&format!("- {}: {}\n", label, hint)),
            None => prompt.push_str(&format!("- {}\n", label)),
        }
    }
    prompt.push('\n');

    prompt.push_str("Reply with the label only, exactly as written above.\n");

    prompt
}

/// Build the SOAP-note prompt
pub fn build_soap_prompt(
    transcript: &str,
    entities: &[Entity],
    metadata: &SegmentMetadata,
    limits: &TextLimits,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(ROLE_PREAMBLE);
    prompt.push_str(" Write a SOAP note for the consultation.\n\n");

    push_transcript(&mut prompt, transcript, limits);
    push_entities(&mut prompt, entities, limits, false);

    prompt.push_str("## Speakers\n");
    prompt.push_str(&format!(
        "Doctor turns: {}, Patient turns: {}\n\n",
        metadata.doctor_turns, metadata.patient_turns
    ));

    prompt.push_str("## Output\n");
    prompt.push_str("Reply with a single nested JSON object with exactly these keys:\n");
    prompt.push_str("```json\n");
    prompt.push_str(
        r#"{
  "Subjective": {
    "Chief_Complaint": "the patient's main complaint",
    "History_of_Present_Illness": "history and description of symptoms"
  },
  "Objective": {
    "Physical_Exam": "physical examination findings",
    "Observations": "clinical observations"
  },
  "Assessment": {
    "Diagnosis": "diagnosis",
    "Severity": "Mild, Moderate or Severe"
  },
  "Plan": {
    "Treatment": "treatment plan and interventions",
    "Follow-Up": "follow-up instructions"
  }
}"#,
    );
    prompt.push_str("\n```\n\n");

    prompt.push_str("## Rules\n");
    prompt.push_str("- Subjective: what the patient reports.\n");
    prompt.push_str("- Objective: what the doctor observes or measures.\n");
    prompt.push_str("- Assessment: the doctor's diagnosis and its severity.\n");
    prompt.push_str("- Plan: treatment, medication and follow-up.\n");
    prompt.push_str("- Every section is an object with string values, not a flat string.\n");
    prompt.push_str("- Output only the JSON object, with no commentary.\n");

    prompt
}

fn push_transcript(prompt: &mut String, transcript: &str, limits: &TextLimits) {
    prompt.push_str("## Transcript\n");
    prompt.push_str(truncate_chars(transcript, limits.llm_max_chars));
    prompt.push_str("\n\n");
}

/// List the first `top_entities_for_llm` entities in extraction order
fn push_entities(prompt: &mut String, entities: &[Entity], limits: &TextLimits, with_confidence: bool) {
    prompt.push_str("## Detected Medical Entities\n");
    if entities.is_empty() {
        prompt.push_str("(none)\n");
    }
    for entity in entities.iter().take(limits.top_entities_for_llm) {
        if with_confidence {
            prompt.push_str(&format!(
                "- {} ({}, confidence: {})\n",
                entity.text, entity.entity_type, entity.confidence
            ));
        } else {
            prompt.push_str(&format!("- {} ({})\n", entity.text, entity.entity_type));
        }
    }
    prompt.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_intent_labels;

    fn entities(n: usize) -> Vec<Entity> {
        (0..n)
            .map(|i| Entity::new(format!("entity{}", i), "Sign_symptom", 0.9, 0, 0))
            .collect()
    }

    #[test]
    fn test_summary_prompt_truncates_transcript() {
        let limits = TextLimits {
            llm_max_chars: 10,
            ..TextLimits::default()
        };
        let prompt = build_summary_prompt("Doctor: abcdefghijklmnop", &[], &limits);

        assert!(prompt.contains("Doctor: ab\n"));
        assert!(!prompt.contains("abc"));
        assert!(prompt.contains("(none)"));
        assert!(prompt.contains("\"Diagnosis\""));
    }

    #[test]
    fn test_prompts_list_top_entities_only() {
        let limits = TextLimits {
            top_entities_for_llm: 3,
            ..TextLimits::default()
        };
        let entities = entities(5);

        let summary = build_summary_prompt("t", &entities, &limits);
        assert!(summary.contains("- entity2 (Sign_symptom, confidence: 0.9)"));
        assert!(!summary.contains("entity3"));

        let soap = build_soap_prompt("t", &entities, &SegmentMetadata::default(), &limits);
        assert!(soap.contains("- entity0 (Sign_symptom)\n"));
        assert!(!soap.contains("entity4"));
    }

    #[test]
    fn test_soap_prompt_includes_turn_counts() {
        let metadata = SegmentMetadata {
            total_turns: 7,
            doctor_turns: 4,
            patient_turns: 3,
            total_characters: 100,
            unmatched_lines: 0,
        };
        let prompt = build_soap_prompt("t", &[], &metadata, &TextLimits::default());
        assert!(prompt.contains("Doctor turns: 4, Patient turns: 3"));
        assert!(prompt.contains("\"Follow-Up\""));
    }

    #[test]
    fn test_intent_prompt() {
        let mut labels = default_intent_labels();
        labels.push("Requesting a sick note".to_string());
        let patient = vec!["My neck hurts.".to_string(), "Will it get better?".to_string()];

        let prompt = build_intent_prompt(&patient, &labels);

        assert!(prompt.contains("1. My neck hurts.\n2. Will it get better?\n"));
        assert!(prompt.contains("- Seeking reassurance: worried"));
        assert!(prompt.contains("- Requesting a sick note\n"));
    }
}
