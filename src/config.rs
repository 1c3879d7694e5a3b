use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level pipeline configuration.
///
/// Built once at start-up and handed by reference to every component
/// constructor. Every section falls back to its defaults, so a TOML file only
/// needs to carry the keys it overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub preprocessing: PreprocessingConfig,
    pub speakers: SpeakerConfig,
    pub entities: EntityCategoryConfig,
    pub ner: NerConfig,
    pub sentiment: SentimentConfig,
    /// Closed intent vocabulary; the first entry is the fallback label
    pub intent_labels: Vec<String>,
    pub limits: TextLimits,
    pub llm: LlmConfig,
    pub huggingface: HuggingFaceConfig,
    pub output: OutputConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            preprocessing: PreprocessingConfig::default(),
            speakers: SpeakerConfig::default(),
            entities: EntityCategoryConfig::default(),
            ner: NerConfig::default(),
            sentiment: SentimentConfig::default(),
            intent_labels: default_intent_labels(),
            limits: TextLimits::default(),
            llm: LlmConfig::default(),
            huggingface: HuggingFaceConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse pipeline configuration")
    }
}

/// Transcript cleaning options
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Words removed (whole-word, case-insensitive) when `remove_fillers` is on
    pub filler_words: Vec<String>,
    pub remove_fillers: bool,
    /// Collapse runs of spaces and tabs to a single space
    pub normalize_whitespace: bool,
    /// Shortest cleaned transcript (in characters) accepted by validation
    pub min_transcript_chars: usize,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            filler_words: ["um", "uh", "like", "you know", "i mean", "well"]
                .into_iter()
                .map(String::from)
                .collect(),
            remove_fillers: false,
            normalize_whitespace: true,
            min_transcript_chars: 50,
        }
    }
}

/// Speaker-prefix patterns for one role
#[derive(Debug, Clone, Deserialize)]
pub struct SpeakerPatterns {
    /// Canonical label reported for this role
    pub label: String,
    /// Regular expressions tried in order; each must match at the start of a line
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeakerConfig {
    pub doctor: SpeakerPatterns,
    pub patient: SpeakerPatterns,
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self {
            doctor: SpeakerPatterns {
                label: "doctor".to_string(),
                patterns: vec![
                    r"(doctor|physician|dr\.?)\s*:".to_string(),
                    r"(provider|clinician|practitioner)\s*:".to_string(),
                    r"MD\s*:".to_string(),
                ],
            },
            patient: SpeakerPatterns {
                label: "patient".to_string(),
                patterns: vec![
                    r"(patient|pt\.?)\s*:".to_string(),
                    r"(client|individual)\s*:".to_string(),
                ],
            },
        }
    }
}

/// A named entity category and the type-label keywords that select it
#[derive(Debug, Clone, Deserialize)]
pub struct EntityCategory {
    pub name: String,
    pub keywords: Vec<String>,
}

impl EntityCategory {
    fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EntityCategoryConfig {
    /// Categories in match order; the first matching category wins
    pub categories: Vec<EntityCategory>,
    /// Catch-all category for entities matching no keyword
    pub default_category: String,
}

impl Default for EntityCategoryConfig {
    fn default() -> Self {
        Self {
            categories: vec![
                EntityCategory::new("symptoms", &["SYMPTOM", "SIGN", "FINDING"]),
                EntityCategory::new(
                    "diseases",
                    &["DISEASE", "CONDITION", "DISORDER", "SYNDROME"],
                ),
                EntityCategory::new(
                    "treatments",
                    &["TREATMENT", "PROCEDURE", "THERAPY", "INTERVENTION"],
                ),
                EntityCategory::new(
                    "anatomy",
                    &["ANATOMY", "BODY_PART", "ORGAN", "TISSUE", "ANATOMICAL"],
                ),
                EntityCategory::new(
                    "medications",
                    &["MEDICATION", "DRUG", "PHARMACEUTICAL", "MEDICINE"],
                ),
            ],
            default_category: "other".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NerConfig {
    /// Token-classification model served by the inference endpoint
    pub model: String,
    /// Entities scoring below this are dropped by the extractor
    pub confidence_threshold: f64,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            model: "d4data/biomedical-ner-all".to_string(),
            confidence_threshold: 0.8,
        }
    }
}

/// The three sentiment categories a classifier result is mapped onto
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SentimentLabels {
    pub anxious: String,
    pub neutral: String,
    pub reassured: String,
}

impl SentimentLabels {
    pub fn all(&self) -> [&str; 3] {
        [&self.anxious, &self.neutral, &self.reassured]
    }
}

impl Default for SentimentLabels {
    fn default() -> Self {
        Self {
            anxious: "Anxious".to_string(),
            neutral: "Neutral".to_string(),
            reassured: "Reassured".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub model: String,
    pub positive_threshold: f64,
    pub negative_threshold: f64,
    /// Input cap for the classifier, in characters
    pub max_input_chars: usize,
    pub labels: SentimentLabels,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            model: "distilbert-base-uncased-finetuned-sst-2-english".to_string(),
            positive_threshold: 0.65,
            negative_threshold: 0.65,
            max_input_chars: 512,
            labels: SentimentLabels::default(),
        }
    }
}

pub fn default_intent_labels() -> Vec<String> {
    [
        "Reporting symptoms",
        "Seeking reassurance",
        "Expressing improvement",
        "Asking questions",
        "Neutral update",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TextLimits {
    /// Characters of transcript sent to the entity extractor
    pub ner_max_chars: usize,
    /// Characters of transcript embedded in generative prompts
    pub llm_max_chars: usize,
    /// Entities (in extraction order) listed in generative prompts
    pub top_entities_for_llm: usize,
    /// Entities whose text is this long or shorter are discarded
    pub min_entity_length: usize,
}

impl Default for TextLimits {
    fn default() -> Self {
        Self {
            ner_max_chars: 5000,
            llm_max_chars: 4000,
            top_entities_for_llm: 25,
            min_entity_length: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Gemini,
    Anthropic,
}

impl LlmProvider {
    /// Environment variable holding the API key for this provider
    pub fn api_key_var(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "GEMINI_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

/// Settings for the generative-model backend
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Model identifier (e.g., "gemini-2.5-flash")
    pub model: String,
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
    pub top_p: f64,
    pub top_k: u32,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Extra attempts after a failed request
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Gemini,
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.0,
            max_tokens: 2048,
            top_p: 0.95,
            top_k: 40,
            timeout_secs: 60,
            max_retries: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HuggingFaceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co/models".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputFilenames {
    pub summary: String,
    pub sentiment: String,
    pub soap: String,
    pub entities: String,
    pub complete: String,
}

impl Default for OutputFilenames {
    fn default() -> Self {
        Self {
            summary: "medical_summary.json".to_string(),
            sentiment: "sentiment_intent.json".to_string(),
            soap: "soap_note.json".to_string(),
            entities: "entities.json".to_string(),
            complete: "complete_results.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Pretty-print JSON documents
    pub pretty: bool,
    pub filenames: OutputFilenames,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data/output"),
            pretty: true,
            filenames: OutputFilenames::default(),
        }
    }
}
