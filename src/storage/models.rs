//! Data models for storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::report::HealthReport;

/// Subscription plan of a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }
}

impl FromStr for SubscriptionTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "premium" => Ok(Self::Premium),
            other => anyhow::bail!("Unknown subscription tier '{}'", other),
        }
    }
}

/// A user's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,

    /// Full number including the country code, e.g. `+919876543210`
    pub phone_number: Option<String>,

    pub display_name: Option<String>,

    pub email: Option<String>,

    pub subscription_tier: SubscriptionTier,

    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            phone_number: None,
            display_name: None,
            email: None,
            subscription_tier: SubscriptionTier::Free,
            updated_at: Utc::now(),
        }
    }

    /// First name used to greet the user on the call
    pub fn caller_name(&self) -> String {
        self.display_name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
            .unwrap_or("User")
            .to_string()
    }
}

/// A completed health report kept after the call is cleared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    /// Unique identifier (UUID)
    pub id: String,

    /// Provider call this report came from
    pub call_id: String,

    pub user_id: String,

    pub created_at: DateTime<Utc>,

    /// Call length in milliseconds
    pub duration_ms: Option<u64>,

    pub report: HealthReport,
}

impl StoredReport {
    pub fn new(
        call_id: String,
        user_id: String,
        duration_ms: Option<u64>,
        report: HealthReport,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            call_id,
            user_id,
            created_at: Utc::now(),
            duration_ms,
            report,
        }
    }
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

impl FromStr for ChatRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "model" => Ok(Self::Model),
            other => anyhow::bail!("Unknown chat role '{}'", other),
        }
    }
}

/// One turn of the assistant chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: String,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(user_id: impl Into<String>, role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: 0, // Will be set by database
            user_id: user_id.into(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}
