//! Profile module for thryve
//!
//! Phone number handling and the profile store contract.

mod phone;

pub use phone::{normalize_phone_number, split_phone_number, SUPPORTED_COUNTRY_CODES};

use anyhow::Result;

use crate::storage::{SubscriptionTier, UserProfile};

/// Durable per-user profile record
pub trait ProfileStore {
    /// Phone number on file, if any
    fn phone_number(&self, user_id: &str) -> Result<Option<String>>;

    fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    fn upsert_profile(&self, profile: &UserProfile) -> Result<()>;

    /// Fails when the user has no profile yet
    fn set_subscription_tier(&self, user_id: &str, tier: SubscriptionTier) -> Result<()>;
}
