//! Health report data model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text shown in place of a field the provider did not supply
pub const UNAVAILABLE_TEXT: &str = "No data available";

/// A single report field.
///
/// `Present("")` and `Unavailable` are different answers: the first means the
/// analysis ran and found nothing, the second means there was nothing to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportField {
    Present(String),
    Unavailable,
}

impl ReportField {
    /// Build a field from optional text, treating blank text as unavailable.
    pub fn from_optional(text: Option<&str>) -> Self {
        match text.map(str::trim) {
            Some(t) if !t.is_empty() => Self::Present(t.to_string()),
            _ => Self::Unavailable,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Present(text) => Some(text),
            Self::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Text for display, with the placeholder for missing data.
    pub fn display(&self) -> &str {
        self.as_text().unwrap_or(UNAVAILABLE_TEXT)
    }
}

impl fmt::Display for ReportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

/// Who said a transcript line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Agent,
    User,
    Other(String),
}

impl Speaker {
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "agent" => Self::Agent,
            "user" => Self::User,
            _ => Self::Other(label.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Agent => "Agent",
            Self::User => "User",
            Self::Other(label) => label,
        }
    }
}

/// One utterance of the call transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub speaker: Speaker,
    pub text: String,
}

/// Structured result of a completed health-check call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Conditions flagged by the analysis
    pub detected_conditions: ReportField,

    pub diet_plan: ReportField,

    pub preventive_measures: ReportField,

    /// User sentiment label from the provider
    pub sentiment: ReportField,

    /// Conversation summary
    pub summary: ReportField,

    /// Whether the provider judged the call successful
    pub call_successful: Option<bool>,

    /// Whether the call reached voicemail
    pub in_voicemail: Option<bool>,

    pub transcript: Vec<TranscriptLine>,
}
