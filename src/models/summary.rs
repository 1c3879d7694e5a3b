use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "Unknown";

/// Structured medical summary of a consultation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalSummary {
    #[serde(rename = "Patient_Name")]
    pub patient_name: String,
    #[serde(rename = "Symptoms")]
    pub symptoms: Vec<String>,
    /// Always a single string; multiple diagnoses are combined
    #[serde(rename = "Diagnosis")]
    pub diagnosis: String,
    #[serde(rename = "Treatment")]
    pub treatment: Vec<String>,
    #[serde(rename = "Current_Status")]
    pub current_status: String,
    #[serde(rename = "Prognosis")]
    pub prognosis: String,
}

impl Default for MedicalSummary {
    fn default() -> Self {
        Self {
            patient_name: UNKNOWN.to_string(),
            symptoms: Vec::new(),
            diagnosis: UNKNOWN.to_string(),
            treatment: Vec::new(),
            current_status: UNKNOWN.to_string(),
            prognosis: UNKNOWN.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_serializes_all_fields() {
        let json = serde_json::to_value(MedicalSummary::default()).unwrap();
        assert_eq!(json["Patient_Name"], "Unknown");
        assert_eq!(json["Symptoms"], serde_json::json!([]));
        assert_eq!(json["Diagnosis"], "Unknown");
        assert_eq!(json["Treatment"], serde_json::json!([]));
        assert_eq!(json["Current_Status"], "Unknown");
        assert_eq!(json["Prognosis"], "Unknown");
    }
}
