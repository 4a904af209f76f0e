//! Billing-related database queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{BillingError, BillingProvider};
use crate::models::billing::Subscription;

/// Reads subscriptions mirrored from the billing provider into Postgres.
#[derive(Clone)]
pub struct PgBillingProvider {
    pool: PgPool,
}

impl PgBillingProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillingProvider for PgBillingProvider {
    /// Most recent subscription for the account, if any.
    async fn get_active_subscription(
        &self,
        account_id: u64,
    ) -> Result<Option<Subscription>, BillingError> {
        let account_key = i64::try_from(account_id)
            .map_err(|_| BillingError::Provider(format!("account id out of range: {account_id}")))?;

        let row = sqlx::query_as::<_, (i64, i64, String, DateTime<Utc>)>(
            "SELECT subscription_id, account_id, status, created_at \
             FROM subscriptions \
             WHERE account_id = $1 \
             ORDER BY created_at DESC, subscription_id DESC \
             LIMIT 1",
        )
        .bind(account_key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(subscription_id, account_id, status, created_at)| {
            Ok(Subscription {
                subscription_id: to_id(subscription_id)?,
                account_id: to_id(account_id)?,
                status,
                created_at,
            })
        })
        .transpose()
    }
}

/// Convert a `BIGINT` key into the unsigned id used by the domain.
fn to_id(value: i64) -> Result<u64, BillingError> {
    u64::try_from(value).map_err(|_| BillingError::Provider(format!("invalid id in store: {value}")))
}
