//! Configuration module for thryve
//!
//! Handles loading and managing application settings from TOML files.

mod settings;

pub use settings::{GeneralSettings, LlmSettings, PollingSettings, ProviderSettings, Settings};
