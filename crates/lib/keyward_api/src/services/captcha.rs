//! Captcha verification run ahead of the login flow.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// Google ReCAPTCHA verification endpoint.
pub const RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Captcha verification errors.
#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("captcha is missing")]
    Missing,

    #[error("captcha rejected: {0:?}")]
    Rejected(Vec<String>),

    #[error("captcha request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// Verify the client-supplied captcha response.
    async fn verify(&self, response: Option<&str>) -> Result<(), CaptchaError>;
}

/// Accepts every request. Used when captcha checks are turned off.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCaptcha;

#[async_trait]
impl CaptchaVerifier for DisabledCaptcha {
    async fn verify(&self, _response: Option<&str>) -> Result<(), CaptchaError> {
        Ok(())
    }
}

/// Google ReCAPTCHA verifier.
#[derive(Clone)]
pub struct ReCaptchaVerifier {
    client: Client,
    secret: String,
    verify_url: String,
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

impl ReCaptchaVerifier {
    pub fn new(client: Client, secret: impl Into<String>) -> Self {
        Self {
            client,
            secret: secret.into(),
            verify_url: RECAPTCHA_VERIFY_URL.to_string(),
        }
    }

    /// Point at a different siteverify endpoint.
    pub fn with_verify_url(mut self, url: impl Into<String>) -> Self {
        self.verify_url = url.into();
        self
    }
}

#[async_trait]
impl CaptchaVerifier for ReCaptchaVerifier {
    async fn verify(&self, response: Option<&str>) -> Result<(), CaptchaError> {
        let response = response
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(CaptchaError::Missing)?;

        let result: SiteVerifyResponse = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", self.secret.as_str()), ("response", response)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if result.success {
            Ok(())
        } else {
            Err(CaptchaError::Rejected(result.error_codes))
        }
    }
}
