//! Entity-extraction and sentiment-classification collaborators.
//!
//! Both are opaque services reached through narrow async traits so the
//! pipeline can run against the Hugging Face Inference API in production and
//! against in-memory doubles in tests.

pub mod huggingface;
pub mod ner;
pub mod sentiment;

use async_trait::async_trait;

use crate::error::CollaboratorError;
use crate::models::Entity;

pub use huggingface::*;
pub use ner::*;
pub use sentiment::*;

/// Extracts high-confidence, de-duplicated medical entities from text
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Vec<Entity>, CollaboratorError>;
}

/// Classifies text, returning the top label and its score
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<(String, f64), CollaboratorError>;
}
