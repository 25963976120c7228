//! Call session manager
//!
//! Owns the lifecycle of a single health-check call: places it, reconciles
//! polled provider status with the local state machine and publishes the
//! parsed report once the analysis arrives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::provider::{CallProvider, CallRecord};
use crate::report::{parse_report, HealthReport, ParseError};
use crate::session::state::{CallStatus, ProviderStatus};
use crate::session::store::ActiveCallStore;
use crate::{SessionError, SessionResult};

/// One attempt to run a health-check call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSession {
    /// Provider-issued id, absent until a call is placed
    pub call_id: Option<String>,

    pub status: CallStatus,

    pub started_at: Option<DateTime<Utc>>,

    pub last_polled_at: Option<DateTime<Utc>>,

    /// Last payload fetched from the provider
    pub raw_record: Option<serde_json::Value>,

    /// Call length in milliseconds
    pub duration_ms: Option<u64>,

    pub recording_url: Option<String>,

    /// Set only once the session is `Completed`
    pub report: Option<HealthReport>,

    /// Set only once the session is `Errored`
    pub error_detail: Option<String>,
}

impl Default for CallSession {
    fn default() -> Self {
        Self {
            call_id: None,
            status: CallStatus::NotStarted,
            started_at: None,
            last_polled_at: None,
            raw_record: None,
            duration_ms: None,
            recording_url: None,
            report: None,
            error_detail: None,
        }
    }
}

impl CallSession {
    fn registered(call_id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            call_id: Some(call_id),
            status: CallStatus::Registered,
            started_at: Some(started_at),
            ..Self::default()
        }
    }
}

pub type Clock = fn() -> DateTime<Utc>;

/// Drives a [`CallSession`] through its lifecycle.
///
/// Polling cadence belongs to the caller; see [`crate::session::watch`].
pub struct SessionManager {
    provider: Box<dyn CallProvider>,
    store: Box<dyn ActiveCallStore>,
    session: CallSession,
    analysis_pending_limit: u32,
    pending_polls: u32,
    clock: Clock,
}

impl SessionManager {
    pub fn new(provider: Box<dyn CallProvider>, store: Box<dyn ActiveCallStore>) -> Self {
        Self {
            provider,
            store,
            session: CallSession::default(),
            analysis_pending_limit: 5,
            pending_polls: 0,
            clock: Utc::now,
        }
    }

    /// Create a manager using the polling policy from settings
    pub fn from_settings(
        settings: &Settings,
        provider: Box<dyn CallProvider>,
        store: Box<dyn ActiveCallStore>,
    ) -> Self {
        Self::new(provider, store).with_analysis_pending_limit(settings.polling.analysis_pending_limit)
    }

    /// Number of consecutive polls that may find an ended call without
    /// analysis before the session fails.
    pub fn with_analysis_pending_limit(mut self, limit: u32) -> Self {
        self.analysis_pending_limit = limit;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn session(&self) -> &CallSession {
        &self.session
    }

    pub fn report(&self) -> Option<&HealthReport> {
        self.session.report.as_ref()
    }

    /// Place a call and persist its id.
    pub async fn start(&mut self, phone_number: &str, caller_name: &str) -> SessionResult<String> {
        let phone_number = phone_number.trim();
        if phone_number.is_empty() {
            return Err(SessionError::Precondition(
                "a phone number is required to start a call".to_string(),
            ));
        }

        if self.session.status.is_terminal() {
            return Err(SessionError::NotReset);
        }
        if let Some(call_id) = &self.session.call_id {
            return Err(SessionError::SessionInProgress(call_id.clone()));
        }
        if let Some(call_id) = self.store.get().map_err(SessionError::storage)? {
            return Err(SessionError::SessionInProgress(call_id));
        }

        let call_id = match self.provider.create_call(phone_number, caller_name).await {
            Ok(call_id) => call_id,
            Err(e) => {
                let detail = format!("failed to create call: {:#}", e);
                self.fail(detail.clone());
                return Err(SessionError::Provider(detail));
            }
        };

        if let Err(e) = self.store.set(&call_id) {
            let err = SessionError::storage(e);
            self.session.call_id = Some(call_id.clone());
            self.fail(format!("call {} was placed but could not be saved", call_id));
            return Err(err);
        }

        self.session = CallSession::registered(call_id.clone(), (self.clock)());
        self.pending_polls = 0;
        info!("Call {} registered", call_id);

        Ok(call_id)
    }

    /// Fetch the latest provider record for the active call and reconcile it.
    ///
    /// Safe to call repeatedly; a terminal session is returned without a
    /// network round-trip.
    pub async fn poll(&mut self) -> SessionResult<CallSession> {
        let call_id = self
            .store
            .get()
            .map_err(SessionError::storage)?
            .ok_or(SessionError::NoActiveSession)?;

        if self.session.call_id.as_deref() != Some(call_id.as_str()) {
            info!("Resuming call {}", call_id);
            self.session = CallSession::registered(call_id.clone(), (self.clock)());
            self.session.started_at = None;
            self.pending_polls = 0;
        }

        if self.session.status.is_terminal() {
            return Ok(self.session.clone());
        }

        let result = self.provider.get_call_details(&call_id).await;

        // The slot may have been reset or replaced while the request was out.
        let active = self.store.get().map_err(SessionError::storage)?;
        if active.as_deref() != Some(call_id.as_str()) {
            warn!("Discarding status for call {}: no longer the active call", call_id);
            return Err(SessionError::Superseded(call_id));
        }

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let detail = format!("failed to fetch call status: {:#}", e);
                self.fail(detail.clone());
                return Err(SessionError::Provider(detail));
            }
        };

        if record.call_id != call_id {
            warn!(
                "Ignoring record for call {} while tracking {}",
                record.call_id, call_id
            );
            return Ok(self.session.clone());
        }

        self.apply(record);
        Ok(self.session.clone())
    }

    /// Clear a finished session so a new call can be started.
    pub fn reset(&mut self) -> SessionResult<()> {
        if !self.session.status.is_terminal() {
            let in_flight = match &self.session.call_id {
                Some(call_id) => Some(call_id.clone()),
                None => self.store.get().map_err(SessionError::storage)?,
            };
            if let Some(call_id) = in_flight {
                return Err(SessionError::SessionInProgress(call_id));
            }
        }

        self.clear()
    }

    /// Clear the session even if a call is still in flight.
    pub fn force_reset(&mut self) -> SessionResult<()> {
        if !self.session.status.is_terminal() {
            if let Some(call_id) = &self.session.call_id {
                warn!(
                    "Abandoning call {} while {}",
                    call_id, self.session.status
                );
            }
        }

        self.clear()
    }

    fn clear(&mut self) -> SessionResult<()> {
        self.store.clear().map_err(SessionError::storage)?;
        self.session = CallSession::default();
        self.pending_polls = 0;
        Ok(())
    }

    fn apply(&mut self, record: CallRecord) {
        self.session.last_polled_at = Some((self.clock)());
        self.session.raw_record = Some(record.raw.clone());
        if record.duration_ms.is_some() {
            self.session.duration_ms = record.duration_ms;
        }
        if record.recording_url.is_some() {
            self.session.recording_url = record.recording_url.clone();
        }

        let status = ProviderStatus::classify(&record.status);
        match status {
            ProviderStatus::Failed => {
                let detail = record
                    .disconnection_reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|reason| !reason.is_empty())
                    .map(|reason| format!("call failed: {}", reason))
                    .unwrap_or_else(|| format!("call failed with status '{}'", record.status));
                self.fail(detail);
            }
            ProviderStatus::Ended => {
                self.advance(CallStatus::Ended);
                if matches!(
                    self.session.status,
                    CallStatus::Ended | CallStatus::AnalysisPending
                ) {
                    self.attach_report(&record);
                }
            }
            ProviderStatus::Unrecognized => {
                warn!(
                    "Unrecognized status '{}' for call {}, continuing to poll",
                    record.status, record.call_id
                );
                self.advance(status.target());
            }
            ProviderStatus::Registered | ProviderStatus::Ongoing => self.advance(status.target()),
        }
    }

    fn attach_report(&mut self, record: &CallRecord) {
        match parse_report(record.analysis.as_ref(), record.transcript.as_deref()) {
            Ok(report) => {
                self.pending_polls = 0;
                self.session.report = Some(report);
                self.transition(CallStatus::Completed);
            }
            Err(ParseError::NotReady) => {
                self.pending_polls += 1;
                if self.pending_polls > self.analysis_pending_limit {
                    self.fail(format!(
                        "analysis timed out after {} polls",
                        self.analysis_pending_limit
                    ));
                } else {
                    self.advance(CallStatus::AnalysisPending);
                }
            }
            Err(ParseError::Malformed(reason)) => {
                error!(
                    "Malformed analysis for call {}: {}; payload: {}",
                    record.call_id, reason, record.raw
                );
                self.fail(format!("malformed analysis: {}", reason));
            }
        }
    }

    fn advance(&mut self, next: CallStatus) {
        if self.session.status.precedes(next) {
            self.transition(next);
        } else if self.session.status != next {
            debug!(
                "Ignoring stale status {} for call in {}",
                next, self.session.status
            );
        }
    }

    fn fail(&mut self, detail: String) {
        if self.session.status.is_terminal() {
            return;
        }
        error!("Call session failed: {}", detail);
        self.session.error_detail = Some(detail);
        self.transition(CallStatus::Errored);
    }

    fn transition(&mut self, next: CallStatus) {
        info!(
            "Call {}: {} -> {}",
            self.session.call_id.as_deref().unwrap_or("-"),
            self.session.status,
            next
        );
        self.session.status = next;
    }
}
