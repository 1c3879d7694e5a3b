use serde::{Deserialize, Serialize};

/// Turn counts and size of a segmented transcript
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    /// Always `doctor_turns + patient_turns`
    pub total_turns: usize,
    pub doctor_turns: usize,
    pub patient_turns: usize,
    /// Length of the cleaned transcript in characters
    pub total_characters: usize,
    /// Non-empty lines that matched no speaker pattern
    pub unmatched_lines: usize,
}

/// A transcript split into doctor and patient utterances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtteranceSet {
    /// Doctor utterances in transcript order, speaker prefix removed
    pub doctor: Vec<String>,
    /// Patient utterances in transcript order, speaker prefix removed
    pub patient: Vec<String>,
    /// The full cleaned transcript
    pub full_text: String,
    pub metadata: SegmentMetadata,
}

impl UtteranceSet {
    /// Build a set from its utterance sequences, deriving the metadata
    pub fn new(
        doctor: Vec<String>,
        patient: Vec<String>,
        full_text: String,
        unmatched_lines: usize,
    ) -> Self {
        let metadata = SegmentMetadata {
            total_turns: doctor.len() + patient.len(),
            doctor_turns: doctor.len(),
            patient_turns: patient.len(),
            total_characters: full_text.chars().count(),
            unmatched_lines,
        };

        Self {
            doctor,
            patient,
            full_text,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_is_derived() {
        let set = UtteranceSet::new(
            vec!["Hello".to_string(), "How long?".to_string()],
            vec!["Hi".to_string()],
            "Doctor: Hello\nPatient: Hi\nDoctor: How long?\nNurse: ok".to_string(),
            1,
        );

        assert_eq!(set.metadata.total_turns, 3);
        assert_eq!(set.metadata.doctor_turns, 2);
        assert_eq!(set.metadata.patient_turns, 1);
        assert_eq!(set.metadata.unmatched_lines, 1);
        assert_eq!(set.metadata.total_characters, set.full_text.chars().count());
    }
}
