use serde::Serialize;

use super::{EntitiesBlock, MedicalSummary, SegmentMetadata, SentimentIntent, SoapNote};

/// Provenance of a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptInfo {
    pub source_file: String,
    /// Sortable run token, also used to name output files
    pub timestamp: String,
    /// ISO-8601 processing time
    pub processing_date: String,
    pub metadata: SegmentMetadata,
}

/// Everything extracted from one transcript
#[derive(Debug, Clone, Serialize)]
pub struct CompositeResult {
    pub transcript_info: TranscriptInfo,
    pub entities: EntitiesBlock,
    pub medical_summary: MedicalSummary,
    pub sentiment_intent: SentimentIntent,
    pub soap_note: SoapNote,
}
