//! API server configuration.

use std::time::Duration;

use keyward_core::config::{AuthConfig, DEFAULT_BILLING_TIMEOUT};

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:4000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Domain used as token audience and issuer.
    pub api_domain: String,
    /// JWT signing secret. Empty means token issuance fails.
    pub jwt_secret: String,
    /// Evaluate subscriptions on login.
    pub billing_enabled: bool,
    /// Bound on a billing provider call.
    pub billing_timeout: Duration,
    /// ReCAPTCHA secret; captcha checks are skipped when `None`.
    pub recaptcha_secret: Option<String>,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable             | Default                            |
    /// |----------------------|------------------------------------|
    /// | `BIND_ADDR`          | `127.0.0.1:4000`                   |
    /// | `DATABASE_URL`       | `postgres://localhost:5432/keyward` |
    /// | `API_DOMAIN`         | `localhost`                        |
    /// | `JWT_SECRET`         | empty (login tokens cannot be signed) |
    /// | `BILLING_ENABLED`    | `false`                            |
    /// | `BILLING_TIMEOUT_MS` | `10000`                            |
    /// | `RECAPTCHA_ENABLED`  | `false`                            |
    /// | `RECAPTCHA_SECRET`   | unset                              |
    pub fn from_env() -> Self {
        let recaptcha_secret = if env_flag("RECAPTCHA_ENABLED") {
            std::env::var("RECAPTCHA_SECRET").ok().filter(|s| !s.is_empty())
        } else {
            None
        };
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:4000".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/keyward".into()),
            api_domain: std::env::var("API_DOMAIN").unwrap_or_else(|_| "localhost".into()),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or_default(),
            billing_enabled: env_flag("BILLING_ENABLED"),
            billing_timeout: std::env::var("BILLING_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_BILLING_TIMEOUT),
            recaptcha_secret,
        }
    }

    /// Engine settings derived from this configuration.
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::new(self.api_domain.clone(), self.jwt_secret.as_bytes().to_vec())
            .with_billing(self.billing_enabled)
            .with_billing_timeout(self.billing_timeout)
    }
}

/// Parse a boolean environment flag. Unset or unrecognized is `false`.
fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse_common_spellings() {
        for v in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(parse_flag(v), "{v}");
        }
        for v in ["", "0", "false", "nope"] {
            assert!(!parse_flag(v), "{v}");
        }
    }

    #[test]
    fn auth_config_carries_settings() {
        let config = ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            pg_connection_url: "postgres://localhost/test".into(),
            api_domain: "api.example.com".into(),
            jwt_secret: "secret".into(),
            billing_enabled: true,
            billing_timeout: Duration::from_millis(250),
            recaptcha_secret: None,
        };
        let auth = config.auth_config();
        assert!(auth.billing_enabled);
        assert_eq!(auth.api_domain, "api.example.com");
        assert_eq!(auth.signing_secret, b"secret");
        assert_eq!(auth.billing_timeout, Duration::from_millis(250));
    }
}
