use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::provider::retell::RetellClient;

/// Snapshot of a call as reported by the voice-call provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub call_id: String,
    /// Free-form provider status, classified by the session manager
    pub status: String,
    pub duration_ms: Option<u64>,
    pub recording_url: Option<String>,
    pub transcript: Option<String>,
    /// Provider's explanation when a call ends abnormally
    pub disconnection_reason: Option<String>,
    pub analysis: Option<CallAnalysis>,
    /// Payload exactly as received
    pub raw: serde_json::Value,
}

/// Post-call analysis attached by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallAnalysis {
    pub in_voicemail: Option<bool>,
    pub summary: Option<String>,
    pub sentiment: Option<String>,
    pub successful: Option<bool>,
    pub custom_data: Option<CustomAnalysisData>,
}

/// Agent-specific analysis fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomAnalysisData {
    /// Health report fields, encoded as a JSON string
    pub detailed_health_report_json: Option<String>,
}

#[async_trait]
pub trait CallProvider: Send + Sync {
    /// Place an outbound call and return the provider's call id.
    async fn create_call(&self, to_number: &str, caller_name: &str) -> Result<String>;

    /// Fetch the latest state of a call.
    async fn get_call_details(&self, call_id: &str) -> Result<CallRecord>;
}

/// Build the call provider from runtime settings.
pub fn build_call_provider(settings: &Settings) -> Result<Box<dyn CallProvider>> {
    Ok(Box::new(RetellClient::from_settings(settings)?))
}
