use std::fmt::Write;

use crate::error::InputError;
use crate::models::{CompositeResult, UtteranceSet};

/// Console summary of a completed run
pub fn format_summary(result: &CompositeResult) -> String {
    let mut out = String::new();
    let info = &result.transcript_info;
    let stats = &result.entities.statistics;

    let _ = writeln!(out, "Processing Summary");
    let _ = writeln!(out, "==================");
    let _ = writeln!(out, "Source: {}", info.source_file);
    let _ = writeln!(out, "Processed: {}", info.processing_date);
    let _ = writeln!(
        out,
        "Turns: {} ({} doctor, {} patient)",
        info.metadata.total_turns, info.metadata.doctor_turns, info.metadata.patient_turns
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Entities");
    let _ = writeln!(out, "--------");
    let _ = writeln!(out, "Total: {}", stats.total);
    for (category, entities) in result.entities.categorized.iter() {
        if !entities.is_empty() {
            let _ = writeln!(out, "  {}: {}", category, entities.len());
        }
    }
    let _ = writeln!(
        out,
        "Average confidence: {:.1}%",
        stats.average_confidence * 100.0
    );
    let _ = writeln!(out);

    let summary = &result.medical_summary;
    let _ = writeln!(out, "Medical Summary");
    let _ = writeln!(out, "---------------");
    let _ = writeln!(out, "Patient: {}", summary.patient_name);
    let _ = writeln!(out, "Diagnosis: {}", summary.diagnosis);
    let _ = writeln!(out, "Symptoms: {}", summary.symptoms.len());
    let _ = writeln!(out, "Current status: {}", summary.current_status);
    let _ = writeln!(out);

    let _ = writeln!(out, "Sentiment: {}", result.sentiment_intent.sentiment);
    let _ = writeln!(out, "Intent: {}", result.sentiment_intent.intent);

    out
}

/// Segmentation report for the `analyze` command
pub fn format_analysis(
    utterances: &UtteranceSet,
    doctor_label: &str,
    patient_label: &str,
    failure: Option<&InputError>,
) -> String {
    let mut out = String::new();
    let metadata = &utterances.metadata;

    let _ = writeln!(out, "Transcript Analysis");
    let _ = writeln!(out, "===================");
    let _ = writeln!(out, "Characters: {}", metadata.total_characters);
    let _ = writeln!(out, "Total turns: {}", metadata.total_turns);
    let _ = writeln!(out, "  {}: {}", doctor_label, metadata.doctor_turns);
    let _ = writeln!(out, "  {}: {}", patient_label, metadata.patient_turns);
    let _ = writeln!(out, "Unmatched lines: {}", metadata.unmatched_lines);
    let _ = writeln!(out);

    match failure {
        None => {
            let _ = writeln!(out, "Validation: passed");
        }
        Some(reason) => {
            let _ = writeln!(out, "Validation: failed ({})", reason);
        }
    }

    out
}
