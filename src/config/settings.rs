//! Application settings management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::APP_NAME;

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// Voice-call provider settings
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Call status polling policy
    #[serde(default)]
    pub polling: PollingSettings,

    /// Chat assistant settings
    #[serde(default)]
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Data directory for the database and the active call slot
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Profile used when `--user` is not given
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Retell API key
    #[serde(default)]
    pub api_key: String,

    /// Retell agent that conducts the health check
    #[serde(default)]
    pub agent_id: String,

    /// Number the call is placed from (E.164)
    #[serde(default)]
    pub from_number: String,

    /// API base URL
    #[serde(default = "default_provider_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSettings {
    /// Delay between two status polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// Consecutive polls allowed to find an ended call without analysis
    #[serde(default = "default_analysis_pending_limit")]
    pub analysis_pending_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// LLM provider (gemini)
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// API key (for cloud providers)
    #[serde(default)]
    pub api_key: String,

    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API endpoint (for local/custom providers)
    #[serde(default)]
    pub endpoint: String,
}

// Default value functions

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", APP_NAME, APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.local/share/thryve"))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_user_id() -> String {
    "local".to_string()
}

fn default_provider_endpoint() -> String {
    "https://api.retellai.com/v2".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_analysis_pending_limit() -> u32 {
    5
}

fn default_llm_provider() -> String {
    "gemini".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.0-flash".to_string()
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            user_id: default_user_id(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            agent_id: String::new(),
            from_number: String::new(),
            endpoint: default_provider_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            analysis_pending_limit: default_analysis_pending_limit(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            api_key: String::new(),
            model: default_llm_model(),
            endpoint: String::new(),
        }
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::debug!("No config file found, using defaults");
            let mut settings = Self::default();
            settings.apply_env_overrides();
            return Ok(settings);
        }

        let mut settings = Self::load_from(&config_path)?;
        settings.apply_env_overrides();

        Ok(settings)
    }

    /// Parse settings from a specific file without environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply environment variable overrides for secrets left empty in the file.
    fn apply_env_overrides(&mut self) {
        override_if_empty(&mut self.provider.api_key, "THRYVE_RETELL_API_KEY");
        override_if_empty(&mut self.provider.agent_id, "THRYVE_AGENT_ID");
        override_if_empty(&mut self.provider.from_number, "THRYVE_FROM_NUMBER");
        override_if_empty(&mut self.llm.api_key, "THRYVE_GEMINI_API_KEY");
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", APP_NAME, APP_NAME)
            .context("Could not determine config directory")?;

        let config_dir = dirs.config_dir();
        Ok(config_dir.join("config.toml"))
    }

    /// Write default configuration to a file
    pub fn write_default(path: &Path) -> Result<()> {
        let settings = Self::default();
        let content = toml::to_string_pretty(&settings)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the database path
    pub fn database_path(&self) -> PathBuf {
        self.general.data_dir.join("thryve.db")
    }

    /// Get the file holding the id of the call in flight
    pub fn active_call_path(&self) -> PathBuf {
        self.general.data_dir.join("active_call")
    }

    /// Interval between two status polls
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.polling.interval_ms.max(1))
    }
}

fn override_if_empty(field: &mut String, var: &str) {
    if !field.trim().is_empty() {
        return;
    }
    if let Ok(value) = std::env::var(var) {
        if !value.trim().is_empty() {
            *field = value;
        }
    }
}
