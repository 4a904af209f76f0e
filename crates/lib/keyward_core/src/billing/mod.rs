//! Billing status resolution.
//!
//! The billing provider speaks its own status vocabulary. It is mapped here,
//! once, into [`BillingState`]; nothing downstream looks at provider strings.

pub mod alert;
pub mod queries;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::billing::Subscription;

/// Errors talking to the billing provider.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Billing provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("Provider error: {0}")]
    Provider(String),
}

/// Internal billing state of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingState {
    Active,
    Inactive,
    /// Unrecognized provider status, carried for alerting only.
    Unknown(String),
}

impl BillingState {
    /// Map a provider (Stripe) subscription status.
    pub fn from_status(status: &str) -> Self {
        match status {
            "active" | "trialing" => BillingState::Active,
            "past_due" | "unpaid" | "canceled" | "incomplete" | "incomplete_expired" => {
                BillingState::Inactive
            }
            other => BillingState::Unknown(other.to_string()),
        }
    }

    /// Map an optional subscription. No subscription at all is `Inactive`.
    pub fn from_subscription(subscription: Option<&Subscription>) -> Self {
        match subscription {
            None => BillingState::Inactive,
            Some(s) => Self::from_status(&s.status),
        }
    }
}

/// Source of subscription records, keyed by account.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn get_active_subscription(
        &self,
        account_id: u64,
    ) -> Result<Option<Subscription>, BillingError>;
}

/// Resolve the billing state of an account, bounded by `timeout`.
pub async fn resolve_billing_state(
    provider: &dyn BillingProvider,
    account_id: u64,
    timeout: Duration,
) -> Result<BillingState, BillingError> {
    let subscription = tokio::time::timeout(timeout, provider.get_active_subscription(account_id))
        .await
        .map_err(|_| BillingError::Timeout(timeout))??;
    Ok(BillingState::from_subscription(subscription.as_ref()))
}
