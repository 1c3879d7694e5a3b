pub mod config;
pub mod error;
pub mod inference;
pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod stages;
pub mod text;

pub use config::PipelineConfig;
pub use error::{CollaboratorError, ConfigError, InputError, OutputError, PipelineError};
pub use inference::{EntityExtractor, SentimentClassifier};
pub use io::{format_analysis, format_summary, read_transcript};
pub use llm::TextGenerator;
pub use models::{CompositeResult, MedicalSummary, SentimentIntent, SoapNote, UtteranceSet};
pub use pipeline::Pipeline;
pub use stages::{Categorizer, Normalizer, ResultWriter};
