use async_trait::async_trait;
use serde::Deserialize;

use super::{HuggingFaceClient, SentimentClassifier};
use crate::config::{SentimentConfig, SentimentLabels};
use crate::error::CollaboratorError;
use crate::text::truncate_chars;

/// A label/score pair from a text-classification model
#[derive(Debug, Clone, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Text-classification endpoints return either a flat list or one list per input
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassificationResponse {
    fn top(self) -> Option<LabelScore> {
        let scores = match self {
            ClassificationResponse::Nested(lists) => lists.into_iter().next().unwrap_or_default(),
            ClassificationResponse::Flat(list) => list,
        };
        scores.into_iter().max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

/// Map a classifier label/score onto the three sentiment categories.
///
/// "positive" at or above the positive threshold is reassured, "negative" at
/// or above the negative threshold is anxious, anything else is neutral.
/// Labels are compared case-insensitively.
pub fn map_sentiment<'a>(label: &str, score: f64, config: &'a SentimentConfig) -> &'a str {
    let labels: &SentimentLabels = &config.labels;
    if label.eq_ignore_ascii_case("positive") && score >= config.positive_threshold {
        &labels.reassured
    } else if label.eq_ignore_ascii_case("negative") && score >= config.negative_threshold {
        &labels.anxious
    } else {
        &labels.neutral
    }
}

#[derive(serde::Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
}

/// Sentiment classifier backed by a hosted text-classification model
pub struct HfSentimentClassifier {
    client: HuggingFaceClient,
    model: String,
    max_chars: usize,
}

impl HfSentimentClassifier {
    pub fn new(client: HuggingFaceClient, config: &SentimentConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            max_chars: config.max_input_chars,
        }
    }
}

#[async_trait]
impl SentimentClassifier for HfSentimentClassifier {
    async fn classify(&self, text: &str) -> Result<(String, f64), CollaboratorError> {
        let request = ClassifyRequest {
            inputs: truncate_chars(text, self.max_chars),
        };

        let response: ClassificationResponse = self.client.infer(&self.model, &request).await?;
        response
            .top()
            .map(|top| (top.label, top.score))
            .ok_or(CollaboratorError::EmptyResponse)
    }
}
