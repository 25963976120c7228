//! Call lifecycle states and provider status classification

use serde::{Deserialize, Serialize};

/// Local state of a health-check call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// No call has been placed
    NotStarted,
    /// Provider accepted the call
    Registered,
    /// Call connected and in progress
    Ongoing,
    /// Call finished, analysis not inspected yet
    Ended,
    /// Call finished, waiting for the provider's analysis
    AnalysisPending,
    /// Report parsed
    Completed,
    /// Call or analysis failed
    Errored,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Registered => "registered",
            Self::Ongoing => "ongoing",
            Self::Ended => "ended",
            Self::AnalysisPending => "analysis_pending",
            Self::Completed => "completed",
            Self::Errored => "errored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Errored)
    }

    /// Position along the lifecycle. `Errored` sits outside the ordering.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::NotStarted => Some(0),
            Self::Registered => Some(1),
            Self::Ongoing => Some(2),
            Self::Ended => Some(3),
            Self::AnalysisPending => Some(4),
            Self::Completed => Some(5),
            Self::Errored => None,
        }
    }

    /// Whether moving to `next` goes forward along the lifecycle.
    pub fn precedes(&self, next: CallStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (Some(current), Some(next)) => next > current,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Human-readable headline for the state
    pub fn headline(&self) -> &'static str {
        match self {
            Self::NotStarted => "No health check in progress",
            Self::Registered => "Initiating your call...",
            Self::Ongoing => "Your conversation is in progress...",
            Self::Ended => "Call completed. Preparing your analysis...",
            Self::AnalysisPending => "Analyzing your conversation...",
            Self::Completed => "Your health report is ready",
            Self::Errored => "There was an error with your call",
        }
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider status vocabulary, reduced to what the lifecycle cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatus {
    Registered,
    Ongoing,
    Ended,
    Failed,
    /// Not in the known vocabulary
    Unrecognized,
}

impl ProviderStatus {
    pub fn classify(status: &str) -> Self {
        match status.trim().to_lowercase().as_str() {
            "registered" | "queued" => Self::Registered,
            "ongoing" | "in_progress" | "in-progress" | "connected" => Self::Ongoing,
            "ended" | "completed" => Self::Ended,
            "error" | "failed" | "not_connected" => Self::Failed,
            _ => Self::Unrecognized,
        }
    }

    /// Local state a status maps to. Unknown statuses keep the call polling.
    pub fn target(&self) -> CallStatus {
        match self {
            Self::Registered => CallStatus::Registered,
            Self::Ongoing | Self::Unrecognized => CallStatus::Ongoing,
            Self::Ended => CallStatus::Ended,
            Self::Failed => CallStatus::Errored,
        }
    }
}
