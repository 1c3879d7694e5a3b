use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::{PipelineConfig, SentimentConfig, TextLimits};
use crate::error::CollaboratorError;
use crate::inference::{map_sentiment, SentimentClassifier};
use crate::llm::{
    build_intent_prompt, build_soap_prompt, build_summary_prompt, parse_json_object,
    resolve_intent, strip_code_fence, validate_sentiment_intent, validate_soap, validate_summary,
    TextGenerator,
};
use crate::models::{
    Entity, MedicalSummary, SegmentMetadata, SentimentIntent, SoapNote, UtteranceSet,
};
use crate::text::truncate_chars;

/// The three generated documents of one run
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub medical_summary: MedicalSummary,
    pub sentiment_intent: SentimentIntent,
    pub soap_note: SoapNote,
}

/// Execute the generation stage.
///
/// Summary, sentiment/intent and SOAP depend only on the segmented transcript
/// and the extracted entities, so the three run concurrently. Each one
/// degrades to its default record on its own.
pub async fn execute_generation_stage(
    generator: &dyn TextGenerator,
    classifier: &dyn SentimentClassifier,
    utterances: &UtteranceSet,
    entities: &[Entity],
    config: &PipelineConfig,
) -> GenerationResult {
    let (medical_summary, sentiment_intent, soap_note) = tokio::join!(
        generate_summary(generator, &utterances.full_text, entities, &config.limits),
        analyze_sentiment_intent(
            classifier,
            generator,
            &utterances.patient,
            &config.sentiment,
            &config.intent_labels,
        ),
        generate_soap(
            generator,
            &utterances.full_text,
            entities,
            &utterances.metadata,
            &config.limits,
        ),
    );

    GenerationResult {
        medical_summary,
        sentiment_intent,
        soap_note,
    }
}

/// Ask the generator for a JSON object
async fn generate_json(generator: &dyn TextGenerator, prompt: &str) -> Result<Value, CollaboratorError> {
    let response = generator.generate(prompt).await?;
    debug!("Raw generator response: {}", response);
    parse_json_object(&response)
}

/// Generate the medical summary; any failure yields the default summary
pub async fn generate_summary(
    generator: &dyn TextGenerator,
    transcript: &str,
    entities: &[Entity],
    limits: &TextLimits,
) -> MedicalSummary {
    info!("Generating medical summary");
    let prompt = build_summary_prompt(transcript, entities, limits);

    match generate_json(generator, &prompt).await {
        Ok(candidate) => {
            info!("Medical summary generated");
            validate_summary(&candidate)
        }
        Err(e) => {
            warn!(stage = "summary", "Summary generation failed, using defaults: {}", e);
            MedicalSummary::default()
        }
    }
}

/// Classify patient sentiment and intent.
///
/// Sentiment comes from the classifier, intent from the generator. Each falls
/// back independently: neutral sentiment, or the first intent label.
pub async fn analyze_sentiment_intent(
    classifier: &dyn SentimentClassifier,
    generator: &dyn TextGenerator,
    patient_utterances: &[String],
    config: &SentimentConfig,
    intent_labels: &[String],
) -> SentimentIntent {
    if patient_utterances.is_empty() {
        warn!(stage = "sentiment", "No patient utterances, using defaults");
        return SentimentIntent::default_for(&config.labels);
    }

    info!("Analyzing patient sentiment and intent");
    let patient_text = patient_utterances.join(" ");
    let classifier_input = truncate_chars(&patient_text, config.max_input_chars);
    let intent_prompt = build_intent_prompt(patient_utterances, intent_labels);

    let (classified, intent_response) = tokio::join!(
        classifier.classify(classifier_input),
        generator.generate(&intent_prompt),
    );

    let sentiment = match classified {
        Ok((label, score)) => {
            debug!("Classifier: {} ({:.3})", label, score);
            map_sentiment(&label, score, config).to_string()
        }
        Err(e) => {
            warn!(stage = "sentiment", "Sentiment classification failed, using neutral: {}", e);
            config.labels.neutral.clone()
        }
    };

    let intent = match intent_response {
        Ok(response) => {
            debug!("Raw intent response: {}", response);
            resolve_intent(strip_code_fence(&response), intent_labels).to_string()
        }
        Err(e) => {
            warn!(stage = "intent", "Intent detection failed, using first label: {}", e);
            intent_labels.first().cloned().unwrap_or_default()
        }
    };

    let record = validate_sentiment_intent(
        &json!({ "Sentiment": sentiment, "Intent": intent }),
        &config.labels,
        intent_labels,
    );
    info!("Sentiment: {}, intent: {}", record.sentiment, record.intent);
    record
}

/// Generate the SOAP note; a failed call yields the default note
pub async fn generate_soap(
    generator: &dyn TextGenerator,
    transcript: &str,
    entities: &[Entity],
    metadata: &SegmentMetadata,
    limits: &TextLimits,
) -> SoapNote {
    info!("Generating SOAP note");
    let prompt = build_soap_prompt(transcript, entities, metadata, limits);

    match generate_json(generator, &prompt).await {
        Ok(candidate) => {
            info!("SOAP note generated");
            validate_soap(&candidate)
        }
        Err(e) => {
            warn!(stage = "soap", "SOAP generation failed, using defaults: {}", e);
            SoapNote::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_intent_labels;
    use crate::models::{Objective, NOT_DOCUMENTED};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers by prompt kind, recognized from the prompt text
    struct ScriptedGenerator {
        summary: Result<&'static str, ()>,
        intent: Result<&'static str, ()>,
        soap: Result<&'static str, ()>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(
            summary: Result<&'static str, ()>,
            intent: Result<&'static str, ()>,
            soap: Result<&'static str, ()>,
        ) -> Self {
            Self {
                summary,
                intent,
                soap,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let answer = if prompt.contains("primary intent") {
                self.intent
            } else if prompt.contains("SOAP note") {
                self.soap
            } else {
                self.summary
            };
            answer
                .map(str::to_string)
                .map_err(|_| CollaboratorError::Request("backend unavailable".into()))
        }
    }

    struct FixedClassifier(Result<(&'static str, f64), ()>);

    #[async_trait]
    impl SentimentClassifier for FixedClassifier {
        async fn classify(&self, text: &str) -> Result<(String, f64), CollaboratorError> {
            assert!(text.chars().count() <= 512);
            self.0
                .map(|(label, score)| (label.to_string(), score))
                .map_err(|_| CollaboratorError::Timeout)
        }
    }

    fn utterances() -> UtteranceSet {
        UtteranceSet::new(
            vec!["How are you feeling today?".to_string()],
            vec![
                "My neck still hurts after the accident.".to_string(),
                "Will I be okay?".to_string(),
            ],
            "Doctor: How are you feeling today?\nPatient: My neck still hurts after the accident.\nPatient: Will I be okay?".to_string(),
            0,
        )
    }

    const SUMMARY_JSON: &str = r#"```json
{"Patient_Name": "Janet Jones", "Symptoms": ["Neck pain"], "Diagnosis": "Whiplash injury",
 "Treatment": ["Physiotherapy"], "Current_Status": "Improving", "Prognosis": "Full recovery"}
```"#;

    const SOAP_JSON: &str = r#"{"Subjective": {"Chief_Complaint": "Neck pain",
 "History_of_Present_Illness": "Car accident"},
 "Assessment": {"Diagnosis": "Whiplash", "Severity": "Mild"},
 "Plan": {"Treatment": "Physiotherapy", "Follow-Up": "Six months"}}"#;

    #[tokio::test]
    async fn test_generation_stage_happy_path() {
        let generator = ScriptedGenerator::new(Ok(SUMMARY_JSON), Ok("Seeking reassurance"), Ok(SOAP_JSON));
        let classifier = FixedClassifier(Ok(("NEGATIVE", 0.93)));
        let config = PipelineConfig::default();

        let result =
            execute_generation_stage(&generator, &classifier, &utterances(), &[], &config).await;

        assert_eq!(result.medical_summary.patient_name, "Janet Jones");
        assert_eq!(result.medical_summary.diagnosis, "Whiplash injury");
        assert_eq!(result.sentiment_intent.sentiment, "Anxious");
        assert_eq!(result.sentiment_intent.intent, "Seeking reassurance");
        assert_eq!(result.soap_note.subjective.chief_complaint, "Neck pain");
        assert_eq!(result.soap_note.objective, Objective::default());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_summary_scenario_c_not_json() {
        let generator = ScriptedGenerator::new(Ok("not json"), Ok(""), Ok(""));
        let summary = generate_summary(&generator, "transcript", &[], &TextLimits::default()).await;
        assert_eq!(summary, MedicalSummary::default());
    }

    #[tokio::test]
    async fn test_each_stage_degrades_independently() {
        let generator = ScriptedGenerator::new(Err(()), Ok("Asking questions"), Ok("```json\n[]\n```"));
        let classifier = FixedClassifier(Err(()));
        let config = PipelineConfig::default();

        let result =
            execute_generation_stage(&generator, &classifier, &utterances(), &[], &config).await;

        assert_eq!(result.medical_summary, MedicalSummary::default());
        assert_eq!(result.sentiment_intent.sentiment, "Neutral");
        assert_eq!(result.sentiment_intent.intent, "Asking questions");
        assert_eq!(result.soap_note, SoapNote::default());
        assert_eq!(result.soap_note.plan.follow_up, NOT_DOCUMENTED);
    }

    #[tokio::test]
    async fn test_intent_failure_uses_first_label() {
        let generator = ScriptedGenerator::new(Ok("{}"), Err(()), Ok("{}"));
        let classifier = FixedClassifier(Ok(("POSITIVE", 0.99)));
        let config = PipelineConfig::default();

        let record = analyze_sentiment_intent(
            &classifier,
            &generator,
            &utterances().patient,
            &config.sentiment,
            &config.intent_labels,
        )
        .await;

        assert_eq!(record.sentiment, "Reassured");
        assert_eq!(record.intent, "Reporting symptoms");
    }

    #[tokio::test]
    async fn test_intent_embedded_in_extra_text() {
        let generator =
            ScriptedGenerator::new(Ok("{}"), Ok("The patient is mostly expressing improvement."), Ok("{}"));
        let classifier = FixedClassifier(Ok(("POSITIVE", 0.5)));
        let config = PipelineConfig::default();

        let record = analyze_sentiment_intent(
            &classifier,
            &generator,
            &utterances().patient,
            &config.sentiment,
            &config.intent_labels,
        )
        .await;

        assert_eq!(record.sentiment, "Neutral");
        assert_eq!(record.intent, "Expressing improvement");
    }

    #[tokio::test]
    async fn test_nonsense_intent_stays_in_vocabulary() {
        let generator = ScriptedGenerator::new(Ok("{}"), Ok("purple elephant"), Ok("{}"));
        let classifier = FixedClassifier(Ok(("LABEL_0", 0.99)));
        let labels = default_intent_labels();

        let record = analyze_sentiment_intent(
            &classifier,
            &generator,
            &utterances().patient,
            &SentimentConfig::default(),
            &labels,
        )
        .await;

        assert!(labels.contains(&record.intent));
        assert_eq!(record.intent, "Reporting symptoms");
        assert_eq!(record.sentiment, "Neutral");
    }

    #[tokio::test]
    async fn test_blank_or_fenced_intent_reply_uses_first_label() {
        let labels = default_intent_labels();

        for reply in ["", "   ", "```json\n```"] {
            let generator = ScriptedGenerator::new(Ok("{}"), Ok(reply), Ok("{}"));
            let classifier = FixedClassifier(Ok(("NEGATIVE", 0.9)));

            let record = analyze_sentiment_intent(
                &classifier,
                &generator,
                &["My neck hurts".to_string()],
                &SentimentConfig::default(),
                &labels,
            )
            .await;

            assert_eq!(record.intent, "Reporting symptoms", "reply {:?}", reply);
        }
    }

    #[tokio::test]
    async fn test_no_patient_utterances_skips_collaborators() {
        let generator = ScriptedGenerator::new(Ok("{}"), Ok("Asking questions"), Ok("{}"));
        let classifier = FixedClassifier(Ok(("POSITIVE", 0.99)));
        let config = SentimentConfig::default();

        let record =
            analyze_sentiment_intent(&classifier, &generator, &[], &config, &default_intent_labels())
                .await;

        assert_eq!(record, SentimentIntent::default_for(&config.labels));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_classifier_input_is_truncated() {
        let generator = ScriptedGenerator::new(Ok("{}"), Ok("Neutral update"), Ok("{}"));
        let classifier = FixedClassifier(Ok(("NEGATIVE", 0.7)));
        let long = vec!["word ".repeat(400)];

        let record = analyze_sentiment_intent(
            &classifier,
            &generator,
            &long,
            &SentimentConfig::default(),
            &default_intent_labels(),
        )
        .await;

        assert_eq!(record.sentiment, "Anxious");
        assert_eq!(record.intent, "Neutral update");
    }
}
