use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::Settings;
use crate::provider::client::{CallAnalysis, CallProvider, CallRecord, CustomAnalysisData};

const DEFAULT_RETELL_ENDPOINT: &str = "https://api.retellai.com/v2";

/// Client for the Retell voice-call REST API.
pub struct RetellClient {
    http: Client,
    api_key: String,
    agent_id: String,
    from_number: String,
    endpoint: String,
}

impl RetellClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let provider = &settings.provider;

        let api_key = provider.api_key.trim().to_string();
        if api_key.is_empty() {
            anyhow::bail!(
                "Retell API key is missing. Set provider.api_key in config or THRYVE_RETELL_API_KEY."
            );
        }

        let agent_id = provider.agent_id.trim().to_string();
        if agent_id.is_empty() {
            anyhow::bail!(
                "Retell agent id is missing. Set provider.agent_id in config or THRYVE_AGENT_ID."
            );
        }

        let from_number = provider.from_number.trim().to_string();
        if from_number.is_empty() {
            anyhow::bail!(
                "Caller number is missing. Set provider.from_number in config or THRYVE_FROM_NUMBER."
            );
        }

        let endpoint = if provider.endpoint.trim().is_empty() {
            DEFAULT_RETELL_ENDPOINT.to_string()
        } else {
            provider.endpoint.trim().trim_end_matches('/').to_string()
        };

        Ok(Self {
            http: Client::builder()
                .timeout(Duration::from_secs(provider.request_timeout_secs.max(1)))
                .build()
                .context("Failed to build Retell HTTP client")?,
            api_key,
            agent_id,
            from_number,
            endpoint,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }
}

#[async_trait]
impl CallProvider for RetellClient {
    async fn create_call(&self, to_number: &str, caller_name: &str) -> Result<String> {
        tracing::info!("Creating call to {}", to_number);

        let mut dynamic_variables = HashMap::new();
        dynamic_variables.insert("first_name", caller_name);

        let body = CreatePhoneCallRequest {
            from_number: &self.from_number,
            to_number,
            override_agent_id: &self.agent_id,
            retell_llm_dynamic_variables: dynamic_variables,
        };

        let response = self
            .http
            .post(self.url("create-phone-call"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Retell create-phone-call request failed")?;

        let response = response
            .error_for_status()
            .context("Retell returned an error status for create-phone-call")?;

        let payload: CreatePhoneCallResponse = response
            .json()
            .await
            .context("Failed to parse Retell create-phone-call response")?;

        if payload.call_id.trim().is_empty() {
            anyhow::bail!("Retell create-phone-call response did not contain a call id");
        }

        tracing::info!("Call created: {}", payload.call_id);
        Ok(payload.call_id)
    }

    async fn get_call_details(&self, call_id: &str) -> Result<CallRecord> {
        tracing::debug!("Fetching call details for {}", call_id);

        let response = self
            .http
            .get(self.url(&format!("get-call/{}", call_id)))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("Retell get-call request failed")?;

        let response = response
            .error_for_status()
            .context("Retell returned an error status for get-call")?;

        let payload: Value = response
            .json()
            .await
            .context("Failed to parse Retell get-call response")?;

        decode_call(payload)
    }
}

/// Convert a raw get-call payload into a provider-neutral [`CallRecord`].
pub fn decode_call(raw: Value) -> Result<CallRecord> {
    let call: RetellCall =
        serde_json::from_value(raw.clone()).context("Unexpected Retell call payload")?;

    // Older payloads carry only the start/end timestamps, both in epoch ms.
    let duration_ms = call.duration_ms.or_else(|| match (call.start_timestamp, call.end_timestamp) {
        (Some(start), Some(end)) if end >= start => Some(end - start),
        _ => None,
    });

    Ok(CallRecord {
        call_id: call.call_id,
        status: call.call_status.unwrap_or_default(),
        duration_ms,
        recording_url: call.recording_url,
        transcript: call.transcript,
        disconnection_reason: call.disconnection_reason,
        analysis: call.call_analysis.map(RetellCallAnalysis::into_analysis),
        raw,
    })
}

#[derive(Debug, Serialize)]
struct CreatePhoneCallRequest<'a> {
    from_number: &'a str,
    to_number: &'a str,
    override_agent_id: &'a str,
    retell_llm_dynamic_variables: HashMap<&'a str, &'a str>,
}

#[derive(Debug, Deserialize)]
struct CreatePhoneCallResponse {
    #[serde(default)]
    call_id: String,
}

#[derive(Debug, Deserialize)]
struct RetellCall {
    call_id: String,
    call_status: Option<String>,
    duration_ms: Option<u64>,
    start_timestamp: Option<u64>,
    end_timestamp: Option<u64>,
    recording_url: Option<String>,
    transcript: Option<String>,
    disconnection_reason: Option<String>,
    call_analysis: Option<RetellCallAnalysis>,
}

#[derive(Debug, Deserialize)]
struct RetellCallAnalysis {
    in_voicemail: Option<bool>,
    call_summary: Option<String>,
    user_sentiment: Option<String>,
    call_successful: Option<bool>,
    custom_analysis_data: Option<RetellCustomAnalysisData>,
}

#[derive(Debug, Deserialize)]
struct RetellCustomAnalysisData {
    detailed_health_report_json: Option<Value>,
}

impl RetellCallAnalysis {
    fn into_analysis(self) -> CallAnalysis {
        CallAnalysis {
            in_voicemail: self.in_voicemail,
            summary: self.call_summary,
            sentiment: self.user_sentiment,
            successful: self.call_successful,
            custom_data: self.custom_analysis_data.map(|data| CustomAnalysisData {
                // The agent is configured to emit a string, but some payloads
                // arrive with the object already decoded.
                detailed_health_report_json: match data.detailed_health_report_json {
                    Some(Value::String(s)) => Some(s),
                    Some(Value::Null) | None => None,
                    Some(other) => Some(other.to_string()),
                },
            }),
        }
    }
}
