use regex::{Regex, RegexBuilder};
use tracing::{info, warn};

use crate::config::{PipelineConfig, PreprocessingConfig, SpeakerPatterns};
use crate::error::{ConfigError, InputError};
use crate::models::UtteranceSet;

/// Any whitespace except a newline
const HORIZONTAL_WHITESPACE: &str = r"[^\S\n]+";

/// Compiled speaker-prefix patterns for one role
#[derive(Debug, Clone)]
struct SpeakerMatcher {
    label: String,
    patterns: Vec<Regex>,
}

impl SpeakerMatcher {
    fn compile(role: &str, config: &SpeakerPatterns) -> Result<Self, ConfigError> {
        let patterns = config
            .patterns
            .iter()
            .map(|pattern| {
                // Anchor so a marker only counts at the start of the line
                RegexBuilder::new(&format!("^(?:{})", pattern))
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| ConfigError::SpeakerPattern {
                        role: role.to_string(),
                        pattern: pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            label: config.label.clone(),
            patterns,
        })
    }

    /// Strip the first matching prefix, returning the remaining content
    fn strip<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.patterns
            .iter()
            .find_map(|pattern| pattern.find(line))
            .map(|m| line[m.end()..].trim())
    }
}

/// Stage 0: transcript cleaning, speaker segmentation and the input gate
#[derive(Debug, Clone)]
pub struct Normalizer {
    /// Present when whitespace normalization is enabled
    whitespace: Option<Regex>,
    fillers: Option<Vec<Regex>>,
    min_transcript_chars: usize,
    doctor: SpeakerMatcher,
    patient: SpeakerMatcher,
}

impl Normalizer {
    pub fn new(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let doctor = SpeakerMatcher::compile("doctor", &config.speakers.doctor)?;
        let patient = SpeakerMatcher::compile("patient", &config.speakers.patient)?;
        let fillers = compile_fillers(&config.preprocessing)?;
        let whitespace = if config.preprocessing.normalize_whitespace {
            Some(Regex::new(HORIZONTAL_WHITESPACE).map_err(ConfigError::Whitespace)?)
        } else {
            None
        };

        info!(
            "Normalizer ready: {} {} patterns, {} {} patterns",
            doctor.patterns.len(),
            doctor.label,
            patient.patterns.len(),
            patient.label
        );

        Ok(Self {
            whitespace,
            fillers,
            min_transcript_chars: config.preprocessing.min_transcript_chars,
            doctor,
            patient,
        })
    }

    pub fn doctor_label(&self) -> &str {
        &self.doctor.label
    }

    pub fn patient_label(&self) -> &str {
        &self.patient.label
    }

    /// Clean raw transcript text.
    ///
    /// Collapses runs of horizontal whitespace (newlines are kept), removes filler
    /// words when enabled, and trims the ends. The passes are repeated until
    /// nothing changes, so `clean(clean(x)) == clean(x)` holds even when
    /// removing one filler exposes another.
    pub fn clean(&self, text: &str) -> String {
        let mut current = self.clean_once(text);
        loop {
            let next = self.clean_once(&current);
            if next == current {
                break;
            }
            current = next;
        }

        info!("Cleaned transcript: {} characters", current.chars().count());
        current
    }

    fn clean_once(&self, text: &str) -> String {
        let mut text = text.to_string();

        if let Some(fillers) = &self.fillers {
            for filler in fillers {
                text = filler.replace_all(&text, "").into_owned();
            }
        }

        if let Some(whitespace) = &self.whitespace {
            text = whitespace.replace_all(&text, " ").into_owned();
        }

        text.trim().to_string()
    }

    /// Split cleaned text into doctor and patient utterances.
    ///
    /// Each non-empty line is tried against the doctor patterns, then the
    /// patient patterns, in configured order. The matched prefix is stripped.
    /// Lines matching no pattern, and marker-only lines with nothing left
    /// after the prefix, are counted as unmatched.
    pub fn segment(&self, text: &str) -> UtteranceSet {
        let mut doctor = Vec::new();
        let mut patient = Vec::new();
        let mut unmatched_lines = 0;

        for line in text.split('\n') {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match (self.doctor.strip(line), self.patient.strip(line)) {
                (Some(content), _) if !content.is_empty() => doctor.push(content.to_string()),
                (None, Some(content)) if !content.is_empty() => patient.push(content.to_string()),
                _ => unmatched_lines += 1,
            }
        }

        let set = UtteranceSet::new(doctor, patient, text.to_string(), unmatched_lines);

        info!(
            "Split complete: {} {}, {} {} turns",
            set.metadata.doctor_turns,
            self.doctor.label,
            set.metadata.patient_turns,
            self.patient.label
        );
        if unmatched_lines > 0 {
            warn!("{} lines had no speaker turn", unmatched_lines);
        }

        set
    }

    /// Check that a segmented transcript is usable
    pub fn validate(&self, set: &UtteranceSet) -> bool {
        match self.validation_failure(set) {
            Some(reason) => {
                warn!("Transcript rejected: {}", reason);
                false
            }
            None => true,
        }
    }

    /// The reason a segmented transcript is unusable, if any
    pub fn validation_failure(&self, set: &UtteranceSet) -> Option<InputError> {
        if set.doctor.is_empty() {
            return Some(InputError::NoDoctorTurns);
        }
        if set.patient.is_empty() {
            return Some(InputError::NoPatientTurns);
        }

        let chars = set.full_text.chars().count();
        if chars < self.min_transcript_chars {
            return Some(InputError::TooShort {
                chars,
                min: self.min_transcript_chars,
            });
        }

        None
    }
}

fn compile_fillers(config: &PreprocessingConfig) -> Result<Option<Vec<Regex>>, ConfigError> {
    if !config.remove_fillers {
        return Ok(None);
    }

    let fillers = config
        .filler_words
        .iter()
        .filter(|word| !word.trim().is_empty())
        .map(|word| {
            RegexBuilder::new(&format!(r"\b{}\b", regex::escape(word.trim())))
                .case_insensitive(true)
                .build()
                .map_err(|source| ConfigError::FillerWord {
                    word: word.clone(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(fillers))
}
