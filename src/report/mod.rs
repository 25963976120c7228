//! Report module for thryve
//!
//! Turns the provider's post-call analysis into a structured health report.

mod models;
mod parser;
mod transcript;

pub use models::{HealthReport, ReportField, Speaker, TranscriptLine, UNAVAILABLE_TEXT};
pub use parser::{parse_report, ParseError};
pub use transcript::{parse_transcript, render_transcript};
