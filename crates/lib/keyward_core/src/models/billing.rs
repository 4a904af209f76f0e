//! Billing domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription record as reported by the billing provider.
///
/// `status` keeps the provider's own vocabulary; it is mapped once into
/// [`crate::billing::BillingState`] and never branched on elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub subscription_id: u64,
    pub account_id: u64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
