use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use super::{EntityExtractor, HuggingFaceClient};
use crate::config::PipelineConfig;
use crate::error::CollaboratorError;
use crate::models::Entity;
use crate::text::truncate_chars;

/// One aggregated span as returned by a token-classification model
#[derive(Debug, Clone, Deserialize)]
pub struct RawEntity {
    /// Surface text of the span
    pub word: String,
    /// Type label; older endpoints report it as `entity`
    #[serde(alias = "entity")]
    pub entity_group: String,
    pub score: f64,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
}

/// Filter rules applied to raw extractor output
#[derive(Debug, Clone, Copy)]
pub struct EntityFilter {
    pub confidence_threshold: f64,
    /// Spans whose trimmed text is this long or shorter are dropped
    pub min_length: usize,
}

impl EntityFilter {
    /// Keep high-confidence, non-trivial spans, de-duplicated by
    /// case-insensitive text with the first occurrence winning.
    pub fn apply(&self, raw: Vec<RawEntity>) -> Vec<Entity> {
        let mut seen = HashSet::new();
        let mut entities = Vec::new();

        for span in raw {
            if span.score < self.confidence_threshold {
                continue;
            }

            let text = span.word.trim();
            if text.chars().count() <= self.min_length {
                continue;
            }

            if !seen.insert(text.to_lowercase()) {
                continue;
            }

            entities.push(Entity::new(
                text,
                span.entity_group,
                span.score,
                span.start.unwrap_or(0),
                span.end.unwrap_or(0),
            ));
        }

        entities
    }
}

#[derive(serde::Serialize)]
struct NerRequest<'a> {
    inputs: &'a str,
    parameters: NerParameters,
}

#[derive(serde::Serialize)]
struct NerParameters {
    aggregation_strategy: &'static str,
}

/// Entity extractor backed by a hosted token-classification model
pub struct HfEntityExtractor {
    client: HuggingFaceClient,
    model: String,
    max_chars: usize,
    filter: EntityFilter,
}

impl HfEntityExtractor {
    pub fn new(client: HuggingFaceClient, config: &PipelineConfig) -> Self {
        Self {
            client,
            model: config.ner.model.clone(),
            max_chars: config.limits.ner_max_chars,
            filter: EntityFilter {
                confidence_threshold: config.ner.confidence_threshold,
                min_length: config.limits.min_entity_length,
            },
        }
    }
}

#[async_trait]
impl EntityExtractor for HfEntityExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<Entity>, CollaboratorError> {
        let total = text.chars().count();
        if total > self.max_chars {
            warn!(
                "Text too long ({} chars), truncating to {}",
                total, self.max_chars
            );
        }

        let request = NerRequest {
            inputs: truncate_chars(text, self.max_chars),
            parameters: NerParameters {
                aggregation_strategy: "simple",
            },
        };

        let raw: Vec<RawEntity> = self.client.infer(&self.model, &request).await?;
        let raw_count = raw.len();
        let entities = self.filter.apply(raw);

        info!(
            "Extracted {} high-confidence entities (from {} total, threshold={})",
            entities.len(),
            raw_count,
            self.filter.confidence_threshold
        );

        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(word: &str, group: &str, score: f64) -> RawEntity {
        RawEntity {
            word: word.to_string(),
            entity_group: group.to_string(),
            score,
            start: Some(0),
            end: Some(word.len()),
        }
    }

    fn filter() -> EntityFilter {
        EntityFilter {
            confidence_threshold: 0.8,
            min_length: 2,
        }
    }

    #[test]
    fn test_threshold_and_length() {
        let entities = filter().apply(vec![
            raw("headache", "Sign_symptom", 0.95),
            raw("nausea", "Sign_symptom", 0.79),
            raw("ab", "Sign_symptom", 0.99),
            raw("  neck  ", "Biological_structure", 0.8),
        ]);

        let texts: Vec<&str> = entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["headache", "neck"]);
    }

    #[test]
    fn test_case_insensitive_dedup_first_wins() {
        let entities = filter().apply(vec![
            raw("Fever", "Sign_symptom", 0.9),
            raw("fever", "Disease_disorder", 0.99),
            raw("FEVER ", "Sign_symptom", 0.95),
        ]);

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "Fever");
        assert_eq!(entities[0].entity_type, "Sign_symptom");
        assert_eq!(entities[0].confidence, 0.9);
    }

    #[test]
    fn test_parse_raw_response() {
        let json = r#"[
            {"entity_group": "Sign_symptom", "score": 0.9987654, "word": "pain", "start": 12, "end": 16},
            {"entity": "Medication", "score": 0.91, "word": "painkillers"}
        ]"#;

        let raw: Vec<RawEntity> = serde_json::from_str(json).unwrap();
        let entities = filter().apply(raw);

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].confidence, 0.999);
        assert_eq!((entities[0].start, entities[0].end), (12, 16));
        assert_eq!(entities[1].entity_type, "Medication");
        assert_eq!((entities[1].start, entities[1].end), (0, 0));
    }
}
