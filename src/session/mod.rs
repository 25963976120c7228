//! Call session module for thryve
//!
//! Tracks a health-check call from creation to a parsed report.

mod manager;
mod state;
mod store;
mod watch;

pub use manager::{CallSession, Clock, SessionManager};
pub use state::{CallStatus, ProviderStatus};
pub use store::{ActiveCallStore, FileCallIdStore, MemoryCallIdStore};
pub use watch::watch;
