//! thryve - A CLI health companion built around AI voice check-in calls
//!
//! Places an outbound call through a voice-call provider, tracks it to
//! completion and turns the provider's analysis into a health report.

pub mod cli;
pub mod config;
pub mod llm;
pub mod profile;
pub mod provider;
pub mod report;
pub mod session;
pub mod storage;

use thiserror::Error;

/// Errors surfaced by the call session lifecycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Call provider error: {0}")]
    Provider(String),

    #[error("No active call session. Start a call first.")]
    NoActiveSession,

    #[error("Call {0} is still in progress")]
    SessionInProgress(String),

    #[error("The previous call has finished. Reset it before starting a new one.")]
    NotReset,

    #[error("Call {0} is no longer the active session")]
    Superseded(String),

    #[error("Session storage error: {0}")]
    Storage(String),
}

impl SessionError {
    pub(crate) fn storage(err: anyhow::Error) -> Self {
        Self::Storage(format!("{:#}", err))
    }
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Application name
pub const APP_NAME: &str = "thryve";
