//! Extraction of a [`HealthReport`] from provider analysis

use serde_json::{Map, Value};
use thiserror::Error;

use crate::provider::CallAnalysis;
use crate::report::models::{HealthReport, ReportField};
use crate::report::transcript::parse_transcript;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The provider has not attached the analysis yet
    #[error("analysis not available yet")]
    NotReady,

    /// The analysis is present but cannot be decoded
    #[error("malformed health report: {0}")]
    Malformed(String),
}

/// Build a report from a call's analysis and raw transcript.
pub fn parse_report(
    analysis: Option<&CallAnalysis>,
    transcript: Option<&str>,
) -> Result<HealthReport, ParseError> {
    let analysis = analysis.ok_or(ParseError::NotReady)?;

    let encoded = analysis
        .custom_data
        .as_ref()
        .and_then(|data| data.detailed_health_report_json.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ParseError::NotReady)?;

    let fields = decode_fields(encoded)?;

    Ok(HealthReport {
        detected_conditions: field(&fields, &["detected_disease", "detected_conditions"]),
        diet_plan: field(&fields, &["diet_plan"]),
        preventive_measures: field(&fields, &["preventive_measures"]),
        sentiment: ReportField::from_optional(analysis.sentiment.as_deref()),
        summary: ReportField::from_optional(analysis.summary.as_deref()),
        call_successful: analysis.successful,
        in_voicemail: analysis.in_voicemail,
        transcript: transcript.map(parse_transcript).unwrap_or_default(),
    })
}

fn decode_fields(encoded: &str) -> Result<Map<String, Value>, ParseError> {
    match serde_json::from_str::<Value>(encoded) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ParseError::Malformed(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
        Err(e) => Err(ParseError::Malformed(e.to_string())),
    }
}

fn field(fields: &Map<String, Value>, keys: &[&str]) -> ReportField {
    keys.iter()
        .find_map(|key| fields.get(*key))
        .and_then(value_text)
        .map(ReportField::Present)
        .unwrap_or(ReportField::Unavailable)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(value_text)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        other => Some(other.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::CustomAnalysisData;
    use crate::report::models::Speaker;

    fn analysis_with(json: Option<&str>) -> CallAnalysis {
        CallAnalysis {
            in_voicemail: Some(false),
            summary: Some("User reported fatigue.".to_string()),
            sentiment: Some("Neutral".to_string()),
            successful: Some(true),
            custom_data: Some(CustomAnalysisData {
                detailed_health_report_json: json.map(str::to_string),
            }),
        }
    }

    #[test]
    fn missing_analysis_is_not_ready() {
        assert_eq!(parse_report(None, None), Err(ParseError::NotReady));
    }

    #[test]
    fn missing_report_json_is_not_ready() {
        let analysis = analysis_with(None);
        assert_eq!(parse_report(Some(&analysis), None), Err(ParseError::NotReady));

        let mut no_custom = analysis_with(None);
        no_custom.custom_data = None;
        assert_eq!(parse_report(Some(&no_custom), None), Err(ParseError::NotReady));
    }

    #[test]
    fn malformed_report_json_is_fatal() {
        let analysis = analysis_with(Some("{not json"));
        assert!(matches!(
            parse_report(Some(&analysis), None),
            Err(ParseError::Malformed(_))
        ));

        let analysis = analysis_with(Some("[\"a\", \"b\"]"));
        assert!(matches!(
            parse_report(Some(&analysis), None),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn full_report_is_parsed() {
        let analysis = analysis_with(Some(
            r#"{"detected_disease":"Possible hypertension","diet_plan":"Reduce salt","preventive_measures":["Walk daily","Check BP weekly"]}"#,
        ));

        let report =
            parse_report(Some(&analysis), Some("Agent: Hello\nUser: Hi there\n")).unwrap();

        assert_eq!(report.detected_conditions.display(), "Possible hypertension");
        assert_eq!(report.diet_plan.display(), "Reduce salt");
        assert_eq!(report.preventive_measures.display(), "Walk daily\nCheck BP weekly");
        assert_eq!(report.sentiment.display(), "Neutral");
        assert_eq!(report.summary.display(), "User reported fatigue.");
        assert_eq!(report.call_successful, Some(true));
        assert_eq!(report.transcript.len(), 2);
        assert_eq!(report.transcript[1].speaker, Speaker::User);
    }

    #[test]
    fn missing_fields_degrade_to_placeholders() {
        let mut analysis = analysis_with(Some(r#"{"detected_disease":""}"#));
        analysis.summary = None;

        let report = parse_report(Some(&analysis), None).unwrap();

        assert_eq!(report.detected_conditions, ReportField::Present(String::new()));
        assert_eq!(report.diet_plan, ReportField::Unavailable);
        assert_eq!(report.preventive_measures.display(), "No data available");
        assert_eq!(report.summary, ReportField::Unavailable);
        assert!(report.transcript.is_empty());
    }

    #[test]
    fn accepts_alternate_condition_key() {
        let analysis = analysis_with(Some(r#"{"detected_conditions":"None"}"#));
        let report = parse_report(Some(&analysis), None).unwrap();
        assert_eq!(report.detected_conditions.display(), "None");
    }
}
