//! SQLite database management

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::config::Settings;
use crate::profile::ProfileStore;
use crate::storage::models::{
    ChatMessage, ChatRole, StoredReport, SubscriptionTier, UserProfile,
};

/// Database wrapper for thryve
pub struct Database {
    conn: Connection,
}

const CURRENT_SCHEMA_VERSION: i64 = 1;

const REPORT_COLUMNS: &str = "id, call_id, user_id, created_at, duration_ms, report";

impl Database {
    /// Open or create the database
    pub fn open(settings: &Settings) -> Result<Self> {
        let db_path = settings.database_path();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::open_path(&db_path)
    }

    /// Open database at a specific path (useful for testing)
    pub fn open_path(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize database schema
    fn initialize(&self) -> Result<()> {
        let current_version = self.schema_version()?;
        if current_version > CURRENT_SCHEMA_VERSION {
            anyhow::bail!(
                "Database schema version {} is newer than supported version {}",
                current_version,
                CURRENT_SCHEMA_VERSION
            );
        }

        if current_version < 1 {
            self.migrate_to_v1()?;
            self.set_schema_version(1)?;
        }

        Ok(())
    }

    /// Current schema version tracked in PRAGMA user_version.
    pub fn schema_version(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?)
    }

    fn set_schema_version(&self, version: i64) -> Result<()> {
        self.conn
            .execute_batch(&format!("PRAGMA user_version = {};", version))?;
        Ok(())
    }

    fn migrate_to_v1(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS user_profiles (
                user_id TEXT PRIMARY KEY,
                phone_number TEXT,
                display_name TEXT,
                email TEXT,
                subscription_tier TEXT NOT NULL DEFAULT 'free',
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS call_reports (
                id TEXT PRIMARY KEY,
                call_id TEXT NOT NULL UNIQUE,
                user_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                duration_ms INTEGER,
                report TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_call_reports_user
                ON call_reports(user_id, created_at DESC);

            CREATE TABLE IF NOT EXISTS chat_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chat_messages_user
                ON chat_messages(user_id, id);
            "#,
        )?;

        Ok(())
    }

    /// Insert or replace a user profile
    pub fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO user_profiles (user_id, phone_number, display_name, email, subscription_tier, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id) DO UPDATE SET
                phone_number = excluded.phone_number,
                display_name = excluded.display_name,
                email = excluded.email,
                subscription_tier = excluded.subscription_tier,
                updated_at = excluded.updated_at
            "#,
            params![
                profile.user_id,
                profile.phone_number,
                profile.display_name,
                profile.email,
                profile.subscription_tier.as_str(),
                Utc::now().timestamp_millis(),
            ],
        )?;

        Ok(())
    }

    /// Get a user profile
    pub fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let result = self
            .conn
            .query_row(
                "SELECT user_id, phone_number, display_name, email, subscription_tier, updated_at
                 FROM user_profiles WHERE user_id = ?1",
                params![user_id],
                |row| {
                    let tier: String = row.get(4)?;
                    let updated_at: i64 = row.get(5)?;
                    Ok(UserProfile {
                        user_id: row.get(0)?,
                        phone_number: row.get(1)?,
                        display_name: row.get(2)?,
                        email: row.get(3)?,
                        subscription_tier: tier.parse().unwrap_or_default(),
                        updated_at: from_millis(updated_at),
                    })
                },
            )
            .optional()?;

        Ok(result)
    }

    /// Change a user's subscription tier
    pub fn set_subscription_tier(&self, user_id: &str, tier: SubscriptionTier) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE user_profiles SET subscription_tier = ?2, updated_at = ?3 WHERE user_id = ?1",
            params![user_id, tier.as_str(), Utc::now().timestamp_millis()],
        )?;

        if updated == 0 {
            anyhow::bail!("Profile not found: {}", user_id);
        }
        Ok(())
    }

    /// Save a completed report. Saving the same call twice keeps the first copy.
    pub fn save_report(&self, report: &StoredReport) -> Result<StoredReport> {
        let report_json = serde_json::to_string(&report.report)?;

        self.conn.execute(
            r#"
            INSERT OR IGNORE INTO call_reports (id, call_id, user_id, created_at, duration_ms, report)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                report.id,
                report.call_id,
                report.user_id,
                report.created_at.timestamp_millis(),
                report.duration_ms,
                report_json,
            ],
        )?;

        self.get_report_by_call(&report.call_id)?
            .context("Report vanished after insert")
    }

    /// Get the report produced by a call
    pub fn get_report_by_call(&self, call_id: &str) -> Result<Option<StoredReport>> {
        let result = self
            .conn
            .query_row(
                &format!("SELECT {} FROM call_reports WHERE call_id = ?1", REPORT_COLUMNS),
                params![call_id],
                |row| Ok(Self::row_to_report(row)),
            )
            .optional()?;

        result.transpose()
    }

    /// Find a report by ID prefix
    pub fn find_report_by_prefix(&self, user_id: &str, prefix: &str) -> Result<Option<StoredReport>> {
        let pattern = format!("{}%", prefix);

        let result = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM call_reports WHERE user_id = ?1 AND id LIKE ?2
                     ORDER BY created_at DESC LIMIT 1",
                    REPORT_COLUMNS
                ),
                params![user_id, pattern],
                |row| Ok(Self::row_to_report(row)),
            )
            .optional()?;

        result.transpose()
    }

    /// List a user's reports, newest first
    pub fn list_reports(&self, user_id: &str, limit: usize) -> Result<Vec<StoredReport>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM call_reports WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2",
            REPORT_COLUMNS
        ))?;

        let reports = stmt
            .query_map(params![user_id, limit], |row| Ok(Self::row_to_report(row)))?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        Ok(reports)
    }

    /// Append a chat message and return its id
    pub fn insert_chat_message(&self, message: &ChatMessage) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO chat_messages (user_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                message.user_id,
                message.role.as_str(),
                message.content,
                message.created_at.timestamp_millis(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Chat history for a user, oldest first
    pub fn chat_history(&self, user_id: &str) -> Result<Vec<ChatMessage>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, role, content, created_at
             FROM chat_messages
             WHERE user_id = ?1
             ORDER BY id",
        )?;

        let messages = stmt
            .query_map(params![user_id], |row| {
                let role: String = row.get(2)?;
                let created_at: i64 = row.get(4)?;
                Ok((
                    ChatMessage {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        role: ChatRole::User,
                        content: row.get(3)?,
                        created_at: from_millis(created_at),
                    },
                    role,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .map(|(mut message, role)| {
                message.role = role.parse()?;
                Ok(message)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(messages)
    }

    /// Delete a user's chat history
    pub fn clear_chat_history(&self, user_id: &str) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM chat_messages WHERE user_id = ?1", params![user_id])?)
    }

    fn row_to_report(row: &rusqlite::Row) -> Result<StoredReport> {
        let created_at: i64 = row.get(3)?;
        let report_json: String = row.get(5)?;

        Ok(StoredReport {
            id: row.get(0)?,
            call_id: row.get(1)?,
            user_id: row.get(2)?,
            created_at: from_millis(created_at),
            duration_ms: row.get(4)?,
            report: serde_json::from_str(&report_json)
                .context("Stored report is not valid JSON")?,
        })
    }

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let total_profiles: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM user_profiles", [], |row| row.get(0))?;

        let total_reports: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM call_reports", [], |row| row.get(0))?;

        let total_chat_messages: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM chat_messages", [], |row| row.get(0))?;

        Ok(DatabaseStats {
            total_profiles: total_profiles as usize,
            total_reports: total_reports as usize,
            total_chat_messages: total_chat_messages as usize,
        })
    }
}

impl ProfileStore for Database {
    fn phone_number(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self
            .get_profile(user_id)?
            .and_then(|profile| profile.phone_number)
            .filter(|phone| !phone.trim().is_empty()))
    }

    fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Database::get_profile(self, user_id)
    }

    fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        Database::upsert_profile(self, profile)
    }

    fn set_subscription_tier(&self, user_id: &str, tier: SubscriptionTier) -> Result<()> {
        Database::set_subscription_tier(self, user_id, tier)
    }
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub total_profiles: usize,
    pub total_reports: usize,
    pub total_chat_messages: usize,
}
