//! Login engine configuration.

use std::fmt;
use std::time::Duration;

/// Default bound on a single billing provider call.
pub const DEFAULT_BILLING_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings the login engine and token issuer need, passed in explicitly.
#[derive(Clone)]
pub struct AuthConfig {
    /// When false every single-account login is authorized without
    /// consulting billing.
    pub billing_enabled: bool,
    /// API domain, used as token audience and issuer.
    pub api_domain: String,
    /// HMAC signing key for login tokens.
    pub signing_secret: Vec<u8>,
    /// Upper bound on a billing provider call.
    pub billing_timeout: Duration,
}

impl AuthConfig {
    pub fn new(api_domain: impl Into<String>, signing_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            billing_enabled: false,
            api_domain: api_domain.into(),
            signing_secret: signing_secret.into(),
            billing_timeout: DEFAULT_BILLING_TIMEOUT,
        }
    }

    pub fn with_billing(mut self, enabled: bool) -> Self {
        self.billing_enabled = enabled;
        self
    }

    pub fn with_billing_timeout(mut self, timeout: Duration) -> Self {
        self.billing_timeout = timeout;
        self
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("billing_enabled", &self.billing_enabled)
            .field("api_domain", &self.api_domain)
            .field("signing_secret", &"<redacted>")
            .field("billing_timeout", &self.billing_timeout)
            .finish()
    }
}
