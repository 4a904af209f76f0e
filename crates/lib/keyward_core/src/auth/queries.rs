//! Auth-related database queries.

use async_trait::async_trait;
use sqlx::PgPool;

use super::AuthError;
use super::hasher::CredentialDigest;
use crate::models::auth::{Account, Principal, User};

/// Read-only lookup of a login and everything linked to it.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find the login whose email and credential digest both match.
    ///
    /// `Ok(None)` covers both "no such email" and "digest mismatch". A match
    /// with zero linked users is `Ok(Some(..))` with an empty `users` list.
    async fn find_principal(
        &self,
        email: &str,
        digest: &CredentialDigest,
    ) -> Result<Option<Principal>, AuthError>;
}

/// Postgres-backed credential store.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_principal(
        &self,
        email: &str,
        digest: &CredentialDigest,
    ) -> Result<Option<Principal>, AuthError> {
        // Login row and user rows must come from the same snapshot.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let login = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT login_id, email, password_hash FROM logins WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&mut *tx)
        .await?;

        let (login_id, email, password_hash) = match login {
            Some(row) if digest.matches(&row.2) => row,
            _ => {
                tx.rollback().await?;
                return Ok(None);
            }
        };

        let rows = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT u.user_id, u.login_id, a.account_id \
             FROM users u \
             JOIN accounts a ON a.account_id = u.account_id \
             WHERE u.login_id = $1 \
             ORDER BY u.user_id",
        )
        .bind(login_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let users = rows
            .into_iter()
            .map(|(user_id, login_id, account_id)| {
                let account_id = to_id(account_id)?;
                Ok(User {
                    user_id: to_id(user_id)?,
                    login_id: to_id(login_id)?,
                    account_id,
                    account: Account { account_id },
                })
            })
            .collect::<Result<Vec<_>, AuthError>>()?;

        Ok(Some(Principal {
            login_id: to_id(login_id)?,
            email,
            password_hash,
            users,
        }))
    }
}

/// Convert a `BIGINT` key into the unsigned id used by the domain.
fn to_id(value: i64) -> Result<u64, AuthError> {
    u64::try_from(value).map_err(|_| AuthError::Internal(format!("invalid id in store: {value}")))
}
