//! End-to-end orchestration of one transcript.
//!
//! Reading and the segmentation gate are fatal; every collaborator-backed
//! step after that degrades to its default record on its own, so a run that
//! gets past segmentation always produces a fully shaped result.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::{ConfigError, InputError, OutputError, Result};
use crate::inference::{
    EntityExtractor, HfEntityExtractor, HfSentimentClassifier, HuggingFaceClient,
    SentimentClassifier,
};
use crate::io::read_transcript;
use crate::llm::{generator_from_env, TextGenerator};
use crate::models::{CompositeResult, TranscriptInfo, UtteranceSet};
use crate::stages::{
    execute_entity_stage, execute_generation_stage, Categorizer, Normalizer, ResultWriter,
    SavedFiles,
};

/// Run token format; sorts chronologically and names output files
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// ISO-8601 processing date with microseconds
pub const PROCESSING_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

pub struct Pipeline {
    config: PipelineConfig,
    normalizer: Normalizer,
    categorizer: Categorizer,
    extractor: Box<dyn EntityExtractor>,
    classifier: Box<dyn SentimentClassifier>,
    generator: Box<dyn TextGenerator>,
    writer: ResultWriter,
}

impl Pipeline {
    /// Assemble a pipeline from its configuration and collaborators.
    ///
    /// Configuration the core cannot work with (bad speaker patterns, an
    /// empty intent vocabulary) is rejected here rather than mid-run.
    pub fn new(
        config: PipelineConfig,
        extractor: Box<dyn EntityExtractor>,
        classifier: Box<dyn SentimentClassifier>,
        generator: Box<dyn TextGenerator>,
    ) -> Result<Self, ConfigError> {
        if config.intent_labels.is_empty() {
            return Err(ConfigError::EmptyIntentLabels);
        }

        let normalizer = Normalizer::new(&config)?;
        let categorizer = Categorizer::new(&config.entities);
        let writer = ResultWriter::new(&config.output);

        Ok(Self {
            config,
            normalizer,
            categorizer,
            extractor,
            classifier,
            generator,
            writer,
        })
    }

    /// Build a pipeline with the hosted collaborators, taking secrets from the environment
    pub fn from_env(config: PipelineConfig) -> anyhow::Result<Self> {
        let generator = generator_from_env(&config.llm)?;
        let hf = HuggingFaceClient::from_env(&config.huggingface);
        let extractor = HfEntityExtractor::new(hf.clone(), &config);
        let classifier = HfSentimentClassifier::new(hf, &config.sentiment);

        Self::new(config, Box::new(extractor), Box::new(classifier), generator)
            .context("Invalid pipeline configuration")
    }

    /// Write outputs to `directory` instead of the configured one
    pub fn with_output_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        self.writer = self.writer.with_directory(directory);
        self
    }

    pub fn output_dir(&self) -> &Path {
        self.writer.directory()
    }

    /// Read, clean and segment a transcript without applying the input gate
    pub fn segment_file(&self, path: &Path) -> Result<UtteranceSet, InputError> {
        let raw = read_transcript(path)?;
        let cleaned = self.normalizer.clean(&raw);
        Ok(self.normalizer.segment(&cleaned))
    }

    /// Run every stage on one transcript and return the composite result
    pub async fn analyze(&self, path: &Path) -> Result<CompositeResult> {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);
        self.run(path).instrument(span).await
    }

    async fn run(&self, path: &Path) -> Result<CompositeResult> {
        info!("Processing transcript {:?}", path);

        // Stage 0: clean, segment, gate
        let utterances = self.segment_file(path)?;
        if let Some(reason) = self.normalizer.validation_failure(&utterances) {
            return Err(reason.into());
        }

        // Stage 1: entities
        let entities = execute_entity_stage(
            self.extractor.as_ref(),
            &self.categorizer,
            &utterances.full_text,
        )
        .await;

        // Stage 2: summary, sentiment/intent, SOAP
        let generated = execute_generation_stage(
            self.generator.as_ref(),
            self.classifier.as_ref(),
            &utterances,
            &entities.all_entities,
            &self.config,
        )
        .await;

        let now = Local::now();
        let result = CompositeResult {
            transcript_info: TranscriptInfo {
                source_file: path.display().to_string(),
                timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
                processing_date: now.format(PROCESSING_DATE_FORMAT).to_string(),
                metadata: utterances.metadata,
            },
            entities,
            medical_summary: generated.medical_summary,
            sentiment_intent: generated.sentiment_intent,
            soap_note: generated.soap_note,
        };

        info!(
            "Pipeline complete: {} entities, sentiment {}",
            result.entities.statistics.total, result.sentiment_intent.sentiment
        );
        Ok(result)
    }

    /// Persist a result as the four part documents plus the composite
    pub fn save(&self, result: &CompositeResult) -> Result<SavedFiles, OutputError> {
        self.writer.save(result)
    }

    /// Analyze a transcript and save its documents
    pub async fn process(&self, path: &Path) -> Result<CompositeResult> {
        let result = self.analyze(path).await?;
        self.save(&result)?;
        Ok(result)
    }
}
