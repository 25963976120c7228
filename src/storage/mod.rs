//! Storage module for thryve
//!
//! Keeps profiles, report history and chat history in SQLite.

mod database;
mod models;
mod repository;

pub use database::{Database, DatabaseStats};
pub use models::{ChatMessage, ChatRole, StoredReport, SubscriptionTier, UserProfile};
pub use repository::Repository;
