use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thryve::provider::{CallAnalysis, CallProvider, CallRecord, CustomAnalysisData};
use thryve::report::{ReportField, Speaker};
use thryve::session::{watch, ActiveCallStore, CallStatus, MemoryCallIdStore, SessionManager};
use thryve::SessionError;

const HEALTH_REPORT: &str = r#"{
    "detected_disease": "Mild dehydration",
    "diet_plan": ["Drink 3L of water daily", "Add fruit to breakfast"],
    "preventive_measures": "Take short breaks outdoors"
}"#;

/// Provider that replays a script of get-call responses.
///
/// The last response repeats once the script runs out.
#[derive(Clone, Default)]
struct ScriptedProvider {
    call_id: Option<String>,
    responses: Arc<Mutex<VecDeque<Result<CallRecord, String>>>>,
    fetches: Arc<AtomicUsize>,
    creates: Arc<AtomicUsize>,
    /// Slot cleared while a fetch is in flight
    clears_store: Option<MemoryCallIdStore>,
}

impl ScriptedProvider {
    fn placing(call_id: &str) -> Self {
        Self {
            call_id: Some(call_id.to_string()),
            ..Self::default()
        }
    }

    fn then(self, record: CallRecord) -> Self {
        self.responses.lock().unwrap().push_back(Ok(record));
        self
    }

    fn then_fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CallProvider for ScriptedProvider {
    async fn create_call(&self, _to_number: &str, _caller_name: &str) -> Result<String> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        match &self.call_id {
            Some(call_id) => Ok(call_id.clone()),
            None => anyhow::bail!("503 Service Unavailable"),
        }
    }

    async fn get_call_details(&self, _call_id: &str) -> Result<CallRecord> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(store) = &self.clears_store {
            store.clear()?;
        }

        let mut responses = self.responses.lock().unwrap();
        let next = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };

        match next {
            Some(Ok(record)) => Ok(record),
            Some(Err(message)) => anyhow::bail!(message),
            None => anyhow::bail!("no scripted response"),
        }
    }
}

fn record(call_id: &str, status: &str) -> CallRecord {
    CallRecord {
        call_id: call_id.to_string(),
        status: status.to_string(),
        duration_ms: None,
        recording_url: None,
        transcript: None,
        disconnection_reason: None,
        analysis: None,
        raw: json!({ "call_id": call_id, "call_status": status }),
    }
}

fn ended(call_id: &str, report_json: Option<&str>) -> CallRecord {
    let mut record = record(call_id, "ended");
    record.duration_ms = Some(184_000);
    record.transcript = Some("Agent: How are you feeling today?\nUser: A bit tired.\n".to_string());
    record.analysis = Some(CallAnalysis {
        in_voicemail: Some(false),
        summary: Some("User reports fatigue.".to_string()),
        sentiment: Some("Neutral".to_string()),
        successful: Some(true),
        custom_data: Some(CustomAnalysisData {
            detailed_health_report_json: report_json.map(str::to_string),
        }),
    });
    record
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
}

fn manager(provider: &ScriptedProvider, store: &MemoryCallIdStore) -> SessionManager {
    SessionManager::new(Box::new(provider.clone()), Box::new(store.clone())).with_clock(fixed_now)
}

#[tokio::test]
async fn well_formed_call_reaches_completed_with_report() {
    let provider = ScriptedProvider::placing("call_1")
        .then(record("call_1", "registered"))
        .then(record("call_1", "ongoing"))
        .then(ended("call_1", Some(HEALTH_REPORT)));
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store);

    let call_id = manager.start("+919876543210", "Asha").await.unwrap();
    assert_eq!(call_id, "call_1");
    assert_eq!(store.get().unwrap().as_deref(), Some("call_1"));
    assert_eq!(manager.session().status, CallStatus::Registered);

    assert_eq!(manager.poll().await.unwrap().status, CallStatus::Registered);
    assert_eq!(manager.poll().await.unwrap().status, CallStatus::Ongoing);

    let session = manager.poll().await.unwrap();
    assert_eq!(session.status, CallStatus::Completed);
    assert_eq!(session.duration_ms, Some(184_000));
    assert!(session.error_detail.is_none());

    let report = manager.report().expect("completed session carries a report");
    assert_eq!(
        report.detected_conditions,
        ReportField::Present("Mild dehydration".to_string())
    );
    assert_eq!(
        report.diet_plan.display(),
        "Drink 3L of water daily\nAdd fruit to breakfast"
    );
    assert_eq!(report.sentiment.display(), "Neutral");
    assert_eq!(report.transcript.len(), 2);
    assert_eq!(report.transcript[1].speaker, Speaker::User);
}

#[tokio::test]
async fn two_pending_polls_then_analysis_completes() {
    let provider = ScriptedProvider::placing("call_2")
        .then(ended("call_2", None))
        .then(ended("call_2", None))
        .then(ended("call_2", Some(HEALTH_REPORT)));
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store);
    manager.start("+919876543210", "Asha").await.unwrap();

    let mut seen = vec![manager.session().status];
    for _ in 0..3 {
        let status = manager.poll().await.unwrap().status;
        if seen.last() != Some(&status) {
            seen.push(status);
        }
    }

    assert_eq!(
        seen,
        vec![
            CallStatus::Registered,
            CallStatus::AnalysisPending,
            CallStatus::Completed
        ]
    );
}

#[tokio::test]
async fn missing_analysis_stays_pending() {
    let mut without_analysis = record("call_3", "ended");
    without_analysis.duration_ms = Some(60_000);
    let provider = ScriptedProvider::placing("call_3").then(without_analysis);
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store);
    manager.start("+15551234567", "Sam").await.unwrap();

    let session = manager.poll().await.unwrap();
    assert_eq!(session.status, CallStatus::AnalysisPending);
    assert!(session.report.is_none());
    assert!(session.error_detail.is_none());
}

#[tokio::test]
async fn malformed_report_errors_the_session() {
    let provider = ScriptedProvider::placing("call_4").then(ended("call_4", Some("{not json")));
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store);
    manager.start("+919876543210", "Asha").await.unwrap();

    let session = manager.poll().await.unwrap();
    assert_eq!(session.status, CallStatus::Errored);
    assert!(session
        .error_detail
        .as_deref()
        .is_some_and(|detail| detail.contains("malformed")));
    assert!(session.report.is_none());
}

#[tokio::test]
async fn provider_error_status_errors_with_detail() {
    let mut failed = record("call_5", "error");
    failed.disconnection_reason = Some("dial_no_answer".to_string());
    let provider = ScriptedProvider::placing("call_5").then(failed);
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store);
    manager.start("+919876543210", "Asha").await.unwrap();

    let session = manager.poll().await.unwrap();
    assert_eq!(session.status, CallStatus::Errored);
    assert!(session
        .error_detail
        .as_deref()
        .is_some_and(|detail| detail.contains("dial_no_answer")));
}

#[tokio::test]
async fn failed_fetch_is_surfaced_and_recorded() {
    let provider = ScriptedProvider::placing("call_6").then_fail("connection reset");
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store);
    manager.start("+919876543210", "Asha").await.unwrap();

    let err = manager.poll().await.unwrap_err();
    assert!(matches!(err, SessionError::Provider(ref detail) if detail.contains("connection reset")));
    assert_eq!(manager.session().status, CallStatus::Errored);
    assert!(manager.session().error_detail.is_some());
}

#[tokio::test]
async fn failed_create_errors_without_storing_an_id() {
    let provider = ScriptedProvider::default();
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store);

    let err = manager.start("+919876543210", "Asha").await.unwrap_err();
    assert!(matches!(err, SessionError::Provider(_)));
    assert_eq!(manager.session().status, CallStatus::Errored);
    assert_eq!(store.get().unwrap(), None);

    assert_eq!(
        manager.start("+919876543210", "Asha").await,
        Err(SessionError::NotReset)
    );
    manager.reset().unwrap();
    assert_eq!(manager.session().status, CallStatus::NotStarted);
}

#[tokio::test]
async fn empty_phone_number_is_rejected_before_network() {
    let provider = ScriptedProvider::placing("call_7");
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store);

    let err = manager.start("", "Asha").await.unwrap_err();
    assert!(matches!(err, SessionError::Precondition(_)));
    assert_eq!(provider.creates.load(Ordering::SeqCst), 0);
    assert_eq!(store.get().unwrap(), None);
}

#[tokio::test]
async fn second_start_while_in_progress_is_refused() {
    let provider = ScriptedProvider::placing("call_8");
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store);
    manager.start("+919876543210", "Asha").await.unwrap();

    assert_eq!(
        manager.start("+919876543210", "Asha").await,
        Err(SessionError::SessionInProgress("call_8".to_string()))
    );

    let mut other = SessionManager::new(Box::new(provider.clone()), Box::new(store.clone()));
    assert_eq!(
        other.start("+919876543210", "Asha").await,
        Err(SessionError::SessionInProgress("call_8".to_string()))
    );
    assert_eq!(provider.creates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stale_status_never_moves_the_session_backward() {
    let provider = ScriptedProvider::placing("call_9")
        .then(ended("call_9", None))
        .then(record("call_9", "ongoing"))
        .then(record("call_9", "registered"));
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store);
    manager.start("+919876543210", "Asha").await.unwrap();

    assert_eq!(manager.poll().await.unwrap().status, CallStatus::AnalysisPending);
    assert_eq!(manager.poll().await.unwrap().status, CallStatus::AnalysisPending);
    assert_eq!(manager.poll().await.unwrap().status, CallStatus::AnalysisPending);
}

#[tokio::test]
async fn unchanged_response_leaves_session_identical() {
    let provider = ScriptedProvider::placing("call_10").then(record("call_10", "ongoing"));
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store);
    manager.start("+919876543210", "Asha").await.unwrap();

    let first = manager.poll().await.unwrap();
    let second = manager.poll().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.status, CallStatus::Ongoing);
    assert_eq!(provider.fetches(), 2);
}

#[tokio::test]
async fn repeated_pending_polls_are_identical_until_timeout() {
    let provider = ScriptedProvider::placing("call_11").then(ended("call_11", None));
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store).with_analysis_pending_limit(2);
    manager.start("+919876543210", "Asha").await.unwrap();

    let first = manager.poll().await.unwrap();
    let second = manager.poll().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.status, CallStatus::AnalysisPending);

    let third = manager.poll().await.unwrap();
    assert_eq!(third.status, CallStatus::Errored);
    assert!(third
        .error_detail
        .as_deref()
        .is_some_and(|detail| detail.contains("timed out")));
}

#[tokio::test]
async fn terminal_session_is_not_fetched_again() {
    let provider = ScriptedProvider::placing("call_12").then(ended("call_12", Some(HEALTH_REPORT)));
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store);
    manager.start("+919876543210", "Asha").await.unwrap();

    let completed = manager.poll().await.unwrap();
    assert_eq!(completed.status, CallStatus::Completed);

    let again = manager.poll().await.unwrap();
    assert_eq!(again, completed);
    assert_eq!(provider.fetches(), 1);
}

#[tokio::test]
async fn stored_call_is_resumed_by_a_new_manager() {
    let provider = ScriptedProvider::default().then(record("call_13", "ongoing"));
    let store = MemoryCallIdStore::new();
    store.set("call_13").unwrap();
    let mut manager = manager(&provider, &store);

    let session = manager.poll().await.unwrap();
    assert_eq!(session.call_id.as_deref(), Some("call_13"));
    assert_eq!(session.status, CallStatus::Ongoing);
}

#[tokio::test]
async fn record_for_another_call_is_ignored() {
    let provider = ScriptedProvider::placing("call_14").then(ended("call_other", Some(HEALTH_REPORT)));
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store);
    manager.start("+919876543210", "Asha").await.unwrap();

    let session = manager.poll().await.unwrap();
    assert_eq!(session.status, CallStatus::Registered);
    assert!(session.report.is_none());
}

#[tokio::test]
async fn response_for_a_cleared_slot_is_discarded() {
    let store = MemoryCallIdStore::new();
    let provider = ScriptedProvider {
        clears_store: Some(store.clone()),
        ..ScriptedProvider::placing("call_15")
    }
    .then(ended("call_15", Some(HEALTH_REPORT)));
    let mut manager = manager(&provider, &store);
    manager.start("+919876543210", "Asha").await.unwrap();

    assert_eq!(
        manager.poll().await,
        Err(SessionError::Superseded("call_15".to_string()))
    );
    assert_eq!(manager.session().status, CallStatus::Registered);
    assert!(manager.report().is_none());
}

#[tokio::test]
async fn reset_after_completion_allows_a_new_call() {
    let provider = ScriptedProvider::placing("call_16").then(ended("call_16", Some(HEALTH_REPORT)));
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store);
    manager.start("+919876543210", "Asha").await.unwrap();

    assert_eq!(
        manager.reset(),
        Err(SessionError::SessionInProgress("call_16".to_string()))
    );

    manager.poll().await.unwrap();
    manager.reset().unwrap();
    assert_eq!(store.get().unwrap(), None);
    assert!(manager.report().is_none());

    assert_eq!(manager.start("+919876543210", "Asha").await.unwrap(), "call_16");
}

#[tokio::test]
async fn watch_follows_the_call_to_completion() {
    let provider = ScriptedProvider::placing("call_17")
        .then(record("call_17", "ongoing"))
        .then(ended("call_17", None))
        .then(ended("call_17", Some(HEALTH_REPORT)));
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store);
    manager.start("+919876543210", "Asha").await.unwrap();

    let mut changes = Vec::new();
    let session = watch(
        &mut manager,
        Duration::from_millis(1),
        |session| changes.push(session.status),
        std::future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(session.status, CallStatus::Completed);
    assert_eq!(
        changes,
        vec![
            CallStatus::Ongoing,
            CallStatus::AnalysisPending,
            CallStatus::Completed
        ]
    );
    assert_eq!(provider.fetches(), 3);
}

#[tokio::test]
async fn watch_returns_current_snapshot_when_stopped() {
    let provider = ScriptedProvider::placing("call_18").then(record("call_18", "ongoing"));
    let store = MemoryCallIdStore::new();
    let mut manager = manager(&provider, &store);
    manager.start("+919876543210", "Asha").await.unwrap();

    let session = watch(
        &mut manager,
        Duration::from_secs(3600),
        |_| {},
        async {},
    )
    .await
    .unwrap();

    assert!(!session.status.is_terminal());
    assert_eq!(store.get().unwrap().as_deref(), Some("call_18"));
}
