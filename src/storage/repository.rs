//! Repository pattern wrapper for database operations
//!
//! Provides a higher-level interface for common database operations.

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::session::{CallSession, CallStatus};
use crate::storage::{Database, StoredReport, UserProfile};

/// Repository for profiles and report history
pub struct Repository {
    db: Database,
}

impl Repository {
    /// Create a new repository
    pub fn new(settings: &Settings) -> Result<Self> {
        let db = Database::open(settings)?;
        Ok(Self { db })
    }

    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Load a profile, or an empty one if the user has none yet
    pub fn profile_or_new(&self, user_id: &str) -> Result<UserProfile> {
        Ok(self
            .db
            .get_profile(user_id)?
            .unwrap_or_else(|| UserProfile::new(user_id)))
    }

    /// Keep the report of a completed session in the history.
    ///
    /// Returns `None` for sessions that did not complete.
    pub fn archive_session(
        &self,
        user_id: &str,
        session: &CallSession,
    ) -> Result<Option<StoredReport>> {
        if session.status != CallStatus::Completed {
            return Ok(None);
        }

        let call_id = session
            .call_id
            .clone()
            .context("Completed session has no call id")?;
        let report = session
            .report
            .clone()
            .context("Completed session has no report")?;

        let stored = StoredReport::new(call_id, user_id.to_string(), session.duration_ms, report);
        Ok(Some(self.db.save_report(&stored)?))
    }

    /// Find a user's report by ID prefix
    pub fn find_report(&self, user_id: &str, prefix: &str) -> Result<Option<StoredReport>> {
        self.db.find_report_by_prefix(user_id, prefix)
    }

    /// List a user's recent reports
    pub fn list_reports(&self, user_id: &str, limit: usize) -> Result<Vec<StoredReport>> {
        self.db.list_reports(user_id, limit)
    }
}
