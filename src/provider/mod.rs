//! Voice-call provider module
//!
//! Places outbound health-check calls and fetches their status and analysis.

mod client;
mod retell;

pub use client::{build_call_provider, CallAnalysis, CallProvider, CallRecord, CustomAnalysisData};
pub use retell::{decode_call, RetellClient};
