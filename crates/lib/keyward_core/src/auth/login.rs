//! Login decision engine.
//!
//! Verifies a credential pair, decides which account (if any) the login
//! lands in, evaluates billing for that account and issues the matching
//! token. Every path ends in exactly one [`Outcome`].

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::hasher::hash_credential;
use super::jwt::{TokenGrant, issue_token};
use super::queries::CredentialStore;
use super::{AuthError, FailureKind};
use crate::billing::alert::AlertSink;
use crate::billing::{BillingProvider, BillingState, resolve_billing_state};
use crate::config::AuthConfig;
use crate::models::auth::User;

/// Minimum password length, in bytes, after trimming.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Where a login with a lapsed subscription is sent next.
pub const SUBSCRIBE_URL: &str = "/account/subscribe";

/// Normalized login input.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub email: String,
    pub password: String,
}

impl Credential {
    /// Lowercase and trim the email, trim the password, enforce the minimum
    /// password length.
    pub fn normalize(email: &str, password: &str) -> Result<Self, AuthError> {
        let email = email.trim().to_lowercase();
        let password = password.trim().to_string();
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::ValidationError(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(Self { email, password })
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Logged straight into the only linked account.
    Authenticated { token: String },
    /// Logged into the only linked account, but its subscription is not
    /// active. The token carries `authorized = false`.
    AuthenticatedNeedsSubscription { token: String, next_url: String },
    /// Several accounts are linked; the token only allows picking one.
    Disambiguation { token: String, users: Vec<User> },
    Failure { kind: FailureKind, message: String },
}

impl Outcome {
    /// The issued token, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Outcome::Authenticated { token }
            | Outcome::AuthenticatedNeedsSubscription { token, .. }
            | Outcome::Disambiguation { token, .. } => Some(token),
            Outcome::Failure { .. } => None,
        }
    }

    fn failure(err: &AuthError) -> Self {
        Outcome::Failure {
            kind: err.kind(),
            message: err.public_message(),
        }
    }
}

/// Stateless login orchestrator. Safe to share across concurrent requests.
pub struct LoginEngine {
    config: AuthConfig,
    store: Arc<dyn CredentialStore>,
    billing: Arc<dyn BillingProvider>,
    alerts: Arc<dyn AlertSink>,
}

impl LoginEngine {
    pub fn new(
        config: AuthConfig,
        store: Arc<dyn CredentialStore>,
        billing: Arc<dyn BillingProvider>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            config,
            store,
            billing,
            alerts,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Authenticate an email + password pair.
    pub async fn login(&self, email: &str, password: &str) -> Outcome {
        match self.authenticate(email, password).await {
            Ok(outcome) => outcome,
            Err(err) => {
                match err.kind() {
                    FailureKind::Infrastructure => error!(error = %err, "login failed"),
                    FailureKind::UnsupportedBillingStatus => warn!(error = %err, "login aborted"),
                    kind => debug!(?kind, "login rejected"),
                }
                Outcome::failure(&err)
            }
        }
    }

    /// Like [`login`](Self::login), but gives up as soon as `cancel` fires.
    ///
    /// Returns `None` when cancelled; no token is produced in that case.
    pub async fn login_cancellable(
        &self,
        email: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Option<Outcome> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("login cancelled");
                None
            }
            outcome = self.login(email, password) => Some(outcome),
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Outcome, AuthError> {
        let credential = Credential::normalize(email, password)?;
        let digest = hash_credential(&credential.email, &credential.password);

        // Unknown email and wrong password are indistinguishable from here on.
        let principal = self
            .store
            .find_principal(&credential.email, &digest)
            .await?
            .ok_or(AuthError::CredentialError)?;

        match principal.users.len() {
            0 => Err(AuthError::NoLinkedAccounts),
            1 => self.authorize(&principal.users[0]).await,
            count => {
                let token = self.issue(TokenGrant::selection(principal.login_id))?;
                info!(login_id = principal.login_id, count, "login requires account selection");
                Ok(Outcome::Disambiguation {
                    token,
                    users: principal.users,
                })
            }
        }
    }

    async fn authorize(&self, user: &User) -> Result<Outcome, AuthError> {
        let authorized = if self.config.billing_enabled {
            let state = resolve_billing_state(
                self.billing.as_ref(),
                user.account_id,
                self.config.billing_timeout,
            )
            .await?;
            match state {
                BillingState::Active => true,
                BillingState::Inactive => false,
                BillingState::Unknown(status) => {
                    self.alerts.unsupported_billing_status(user.account_id, &status);
                    return Err(AuthError::UnsupportedBillingStatus(status));
                }
            }
        } else {
            true
        };

        let token = self.issue(TokenGrant {
            login_id: user.login_id,
            user_id: user.user_id,
            account_id: user.account_id,
            authorized,
        })?;

        info!(
            login_id = user.login_id,
            user_id = user.user_id,
            account_id = user.account_id,
            authorized,
            "login succeeded"
        );

        if authorized {
            Ok(Outcome::Authenticated { token })
        } else {
            Ok(Outcome::AuthenticatedNeedsSubscription {
                token,
                next_url: SUBSCRIBE_URL.to_string(),
            })
        }
    }

    fn issue(&self, grant: TokenGrant) -> Result<String, AuthError> {
        issue_token(grant, &self.config.api_domain, &self.config.signing_secret)
    }
}

#[cfg(test)]
mod tests {
    use std::mem::discriminant;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::auth::hasher::CredentialDigest;
    use crate::auth::jwt::verify_token;
    use crate::billing::BillingError;
    use crate::models::auth::{Account, Principal, TokenClaims};
    use crate::models::billing::Subscription;

    const DOMAIN: &str = "api.example.com";
    const SECRET: &str = "test-secret";
    const EMAIL: &str = "jane@example.com";
    const PASSWORD: &str = "correct-horse";

    /// In-memory store keyed by email, counting lookups.
    #[derive(Default)]
    struct MemoryStore {
        principals: Vec<Principal>,
        calls: AtomicU32,
    }

    impl MemoryStore {
        fn with_users(user_count: u64) -> Self {
            let login_id = 1;
            let users = (1..=user_count)
                .map(|n| User {
                    user_id: 100 + n,
                    login_id,
                    account_id: 200 + n,
                    account: Account {
                        account_id: 200 + n,
                    },
                })
                .collect();
            Self {
                principals: vec![Principal {
                    login_id,
                    email: EMAIL.to_string(),
                    password_hash: hash_credential(EMAIL, PASSWORD).to_string(),
                    users,
                }],
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialStore for MemoryStore {
        async fn find_principal(
            &self,
            email: &str,
            digest: &CredentialDigest,
        ) -> Result<Option<Principal>, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .principals
                .iter()
                .find(|p| p.email == email && digest.matches(&p.password_hash))
                .cloned())
        }
    }

    /// Store that must never be reached.
    struct UnreachableStore;

    #[async_trait]
    impl CredentialStore for UnreachableStore {
        async fn find_principal(
            &self,
            _email: &str,
            _digest: &CredentialDigest,
        ) -> Result<Option<Principal>, AuthError> {
            unreachable!("store must not be queried for invalid input")
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl CredentialStore for BrokenStore {
        async fn find_principal(
            &self,
            _email: &str,
            _digest: &CredentialDigest,
        ) -> Result<Option<Principal>, AuthError> {
            Err(AuthError::DbError(sqlx::Error::PoolTimedOut))
        }
    }

    struct StalledStore;

    #[async_trait]
    impl CredentialStore for StalledStore {
        async fn find_principal(
            &self,
            _email: &str,
            _digest: &CredentialDigest,
        ) -> Result<Option<Principal>, AuthError> {
            std::future::pending().await
        }
    }

    /// Billing provider returning a fixed status (or none), counting calls.
    struct FixedBilling {
        status: Option<&'static str>,
        fail: bool,
        calls: AtomicU32,
    }

    impl FixedBilling {
        fn status(status: Option<&'static str>) -> Self {
            Self {
                status,
                fail: false,
                calls: AtomicU32::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                status: None,
                fail: true,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BillingProvider for FixedBilling {
        async fn get_active_subscription(
            &self,
            account_id: u64,
        ) -> Result<Option<Subscription>, BillingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BillingError::Provider("stripe unavailable".into()));
            }
            Ok(self.status.map(|status| Subscription {
                subscription_id: 1,
                account_id,
                status: status.to_string(),
                created_at: Utc::now(),
            }))
        }
    }

    #[derive(Default)]
    struct CountingAlerts {
        seen: std::sync::Mutex<Vec<(u64, String)>>,
    }

    impl AlertSink for CountingAlerts {
        fn unsupported_billing_status(&self, account_id: u64, status: &str) {
            self.seen
                .lock()
                .unwrap()
                .push((account_id, status.to_string()));
        }
    }

    struct Harness {
        store: Arc<MemoryStore>,
        billing: Arc<FixedBilling>,
        alerts: Arc<CountingAlerts>,
        engine: LoginEngine,
    }

    fn harness(users: u64, billing_enabled: bool, billing: FixedBilling) -> Harness {
        let store = Arc::new(MemoryStore::with_users(users));
        let billing = Arc::new(billing);
        let alerts = Arc::new(CountingAlerts::default());
        let config = AuthConfig::new(DOMAIN, SECRET).with_billing(billing_enabled);
        let engine = LoginEngine::new(config, store.clone(), billing.clone(), alerts.clone());
        Harness {
            store,
            billing,
            alerts,
            engine,
        }
    }

    fn claims_of(outcome: &Outcome) -> TokenClaims {
        let token = outcome.token().expect("outcome carries a token");
        verify_token(token, DOMAIN, SECRET.as_bytes()).expect("token verifies")
    }

    fn failure_kind(outcome: &Outcome) -> FailureKind {
        match outcome {
            Outcome::Failure { kind, .. } => *kind,
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        let c = Credential::normalize("  Jane@Example.COM \n", "  correct-horse  ").unwrap();
        assert_eq!(c.email, "jane@example.com");
        assert_eq!(c.password, "correct-horse");
    }

    #[test]
    fn credential_debug_redacts_password() {
        let c = Credential::normalize(EMAIL, PASSWORD).unwrap();
        assert!(!format!("{c:?}").contains(PASSWORD));
    }

    #[tokio::test]
    async fn short_password_rejected_before_store() {
        let engine = LoginEngine::new(
            AuthConfig::new(DOMAIN, SECRET),
            Arc::new(UnreachableStore),
            Arc::new(FixedBilling::status(None)),
            Arc::new(CountingAlerts::default()),
        );
        for password in ["", "short", "1234567", "   1234567   "] {
            let outcome = engine.login(EMAIL, password).await;
            assert_eq!(
                outcome,
                Outcome::Failure {
                    kind: FailureKind::InvalidInput,
                    message: "password must be at least 8 characters".into(),
                },
                "password {password:?}"
            );
        }
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_identical() {
        let h = harness(1, false, FixedBilling::status(None));
        let unknown = h.engine.login("nobody@example.com", PASSWORD).await;
        let wrong = h.engine.login(EMAIL, "wrong-password").await;
        assert_eq!(unknown, wrong);
        assert_eq!(failure_kind(&unknown), FailureKind::InvalidCredentials);
        assert_eq!(h.store.calls(), 2);
    }

    #[tokio::test]
    async fn email_is_matched_case_insensitively() {
        let h = harness(1, false, FixedBilling::status(None));
        let outcome = h.engine.login("  JANE@example.com ", PASSWORD).await;
        assert!(matches!(outcome, Outcome::Authenticated { .. }));
    }

    #[tokio::test]
    async fn zero_users_is_no_linked_accounts() {
        let h = harness(0, true, FixedBilling::status(Some("active")));
        let outcome = h.engine.login(EMAIL, PASSWORD).await;
        assert_eq!(failure_kind(&outcome), FailureKind::NoLinkedAccounts);
        assert_eq!(h.billing.calls(), 0);
    }

    #[tokio::test]
    async fn single_user_without_billing_is_authorized() {
        let h = harness(1, false, FixedBilling::status(Some("canceled")));
        let outcome = h.engine.login(EMAIL, PASSWORD).await;
        assert!(matches!(outcome, Outcome::Authenticated { .. }));

        let claims = claims_of(&outcome);
        assert_eq!(claims.login_id, 1);
        assert_eq!(claims.user_id, 101);
        assert_eq!(claims.account_id, 201);
        assert!(claims.authorized);
        assert_eq!(h.billing.calls(), 0);
    }

    #[tokio::test]
    async fn active_subscription_is_authorized() {
        for status in ["active", "trialing"] {
            let h = harness(1, true, FixedBilling::status(Some(status)));
            let outcome = h.engine.login(EMAIL, PASSWORD).await;
            assert!(matches!(outcome, Outcome::Authenticated { .. }), "{status}");
            assert!(claims_of(&outcome).authorized);
            assert_eq!(h.billing.calls(), 1);
        }
    }

    #[tokio::test]
    async fn inactive_subscription_needs_subscription() {
        let h = harness(1, true, FixedBilling::status(Some("past_due")));
        let outcome = h.engine.login(EMAIL, PASSWORD).await;
        match &outcome {
            Outcome::AuthenticatedNeedsSubscription { next_url, .. } => {
                assert_eq!(next_url, SUBSCRIBE_URL)
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        let claims = claims_of(&outcome);
        assert!(!claims.authorized);
        assert_eq!(claims.account_id, 201);
    }

    #[tokio::test]
    async fn missing_subscription_needs_subscription() {
        let h = harness(1, true, FixedBilling::status(None));
        let outcome = h.engine.login(EMAIL, PASSWORD).await;
        assert!(matches!(outcome, Outcome::AuthenticatedNeedsSubscription { .. }));
        assert!(!claims_of(&outcome).authorized);
    }

    #[tokio::test]
    async fn unknown_status_aborts_and_alerts() {
        let h = harness(1, true, FixedBilling::status(Some("paused")));
        let outcome = h.engine.login(EMAIL, PASSWORD).await;
        assert_eq!(failure_kind(&outcome), FailureKind::UnsupportedBillingStatus);
        assert!(outcome.token().is_none());

        let seen = h.alerts.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[(201, "paused".to_string())]);
    }

    #[tokio::test]
    async fn billing_failure_is_infrastructure() {
        let h = harness(1, true, FixedBilling::failing());
        let outcome = h.engine.login(EMAIL, PASSWORD).await;
        assert_eq!(failure_kind(&outcome), FailureKind::Infrastructure);
        assert!(h.alerts.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn multiple_users_get_selection_token() {
        let h = harness(3, true, FixedBilling::status(Some("paused")));
        let outcome = h.engine.login(EMAIL, PASSWORD).await;
        match &outcome {
            Outcome::Disambiguation { users, .. } => assert_eq!(users.len(), 3),
            other => panic!("unexpected outcome {other:?}"),
        }
        let claims = claims_of(&outcome);
        assert_eq!((claims.user_id, claims.account_id), (0, 0));
        assert!(claims.authorized);
        assert!(!claims.is_account_scoped());
        assert_eq!(h.billing.calls(), 0);
    }

    #[tokio::test]
    async fn store_failure_is_infrastructure() {
        let engine = LoginEngine::new(
            AuthConfig::new(DOMAIN, SECRET),
            Arc::new(BrokenStore),
            Arc::new(FixedBilling::status(None)),
            Arc::new(CountingAlerts::default()),
        );
        let outcome = engine.login(EMAIL, PASSWORD).await;
        assert_eq!(
            outcome,
            Outcome::Failure {
                kind: FailureKind::Infrastructure,
                message: "failed to authenticate".into(),
            }
        );
    }

    #[tokio::test]
    async fn missing_signing_secret_is_infrastructure() {
        let store = Arc::new(MemoryStore::with_users(1));
        let engine = LoginEngine::new(
            AuthConfig::new(DOMAIN, Vec::new()),
            store,
            Arc::new(FixedBilling::status(None)),
            Arc::new(CountingAlerts::default()),
        );
        let outcome = engine.login(EMAIL, PASSWORD).await;
        assert_eq!(failure_kind(&outcome), FailureKind::Infrastructure);
    }

    #[tokio::test]
    async fn repeated_logins_produce_same_variant() {
        let h = harness(1, true, FixedBilling::status(Some("active")));
        let first = h.engine.login(EMAIL, PASSWORD).await;
        let second = h.engine.login(EMAIL, PASSWORD).await;
        assert_eq!(discriminant(&first), discriminant(&second));

        let (a, b) = (claims_of(&first), claims_of(&second));
        assert_eq!(
            (a.login_id, a.user_id, a.account_id, a.authorized),
            (b.login_id, b.user_id, b.account_id, b.authorized)
        );
    }

    #[tokio::test]
    async fn cancelled_login_issues_nothing() {
        let engine = LoginEngine::new(
            AuthConfig::new(DOMAIN, SECRET),
            Arc::new(StalledStore),
            Arc::new(FixedBilling::status(None)),
            Arc::new(CountingAlerts::default()),
        );
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        assert!(engine.login_cancellable(EMAIL, PASSWORD, &cancel).await.is_none());
    }

    #[tokio::test]
    async fn uncancelled_login_completes() {
        let h = harness(1, false, FixedBilling::status(None));
        let cancel = CancellationToken::new();
        let outcome = h.engine.login_cancellable(EMAIL, PASSWORD, &cancel).await;
        assert!(matches!(outcome, Some(Outcome::Authenticated { .. })));
    }
}
