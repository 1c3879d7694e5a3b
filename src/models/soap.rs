use serde::{Deserialize, Serialize};

pub const NOT_DOCUMENTED: &str = "Not documented";

fn not_documented() -> String {
    NOT_DOCUMENTED.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subjective {
    #[serde(rename = "Chief_Complaint")]
    pub chief_complaint: String,
    #[serde(rename = "History_of_Present_Illness")]
    pub history_of_present_illness: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    #[serde(rename = "Physical_Exam")]
    pub physical_exam: String,
    #[serde(rename = "Observations")]
    pub observations: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    #[serde(rename = "Diagnosis")]
    pub diagnosis: String,
    #[serde(rename = "Severity")]
    pub severity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(rename = "Treatment")]
    pub treatment: String,
    #[serde(rename = "Follow-Up")]
    pub follow_up: String,
}

impl Default for Subjective {
    fn default() -> Self {
        Self {
            chief_complaint: not_documented(),
            history_of_present_illness: not_documented(),
        }
    }
}

impl Default for Objective {
    fn default() -> Self {
        Self {
            physical_exam: not_documented(),
            observations: not_documented(),
        }
    }
}

impl Default for Assessment {
    fn default() -> Self {
        Self {
            diagnosis: not_documented(),
            severity: not_documented(),
        }
    }
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            treatment: not_documented(),
            follow_up: not_documented(),
        }
    }
}

/// SOAP clinical note; all four sections are always present
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoapNote {
    #[serde(rename = "Subjective")]
    pub subjective: Subjective,
    #[serde(rename = "Objective")]
    pub objective: Objective,
    #[serde(rename = "Assessment")]
    pub assessment: Assessment,
    #[serde(rename = "Plan")]
    pub plan: Plan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_note_shape() {
        let json = serde_json::to_value(SoapNote::default()).unwrap();
        assert_eq!(json["Subjective"]["Chief_Complaint"], NOT_DOCUMENTED);
        assert_eq!(json["Objective"]["Observations"], NOT_DOCUMENTED);
        assert_eq!(json["Assessment"]["Severity"], NOT_DOCUMENTED);
        assert_eq!(json["Plan"]["Follow-Up"], NOT_DOCUMENTED);
    }
}
