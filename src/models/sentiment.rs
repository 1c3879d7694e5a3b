use serde::{Deserialize, Serialize};

use crate::config::SentimentLabels;

/// Intent reported when no intent could be determined at all
pub const UNKNOWN_INTENT: &str = "Unknown";

/// Patient sentiment and primary intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentIntent {
    #[serde(rename = "Sentiment")]
    pub sentiment: String,
    #[serde(rename = "Intent")]
    pub intent: String,
}

impl SentimentIntent {
    /// Neutral sentiment, unknown intent
    pub fn default_for(labels: &SentimentLabels) -> Self {
        Self {
            sentiment: labels.neutral.clone(),
            intent: UNKNOWN_INTENT.to_string(),
        }
    }
}
