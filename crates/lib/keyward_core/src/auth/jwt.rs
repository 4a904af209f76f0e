//! Login token generation and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::AuthError;
use crate::models::auth::TokenClaims;

/// Login token lifetime: 31 days.
pub const TOKEN_LIFETIME_DAYS: i64 = 31;

/// Fixed `sub` claim for every token this service issues.
pub const TOKEN_SUBJECT: &str = "keyward";

/// What a token grants: the resolved login/user/account tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenGrant {
    pub login_id: u64,
    pub user_id: u64,
    pub account_id: u64,
    pub authorized: bool,
}

impl TokenGrant {
    /// Grant for a login that still has to pick one of several accounts.
    pub fn selection(login_id: u64) -> Self {
        Self {
            login_id,
            user_id: 0,
            account_id: 0,
            authorized: true,
        }
    }
}

/// Build the claims for a grant issued at `now`.
pub fn build_claims(grant: TokenGrant, api_domain: &str, now: DateTime<Utc>) -> TokenClaims {
    TokenClaims {
        login_id: grant.login_id,
        user_id: grant.user_id,
        account_id: grant.account_id,
        authorized: grant.authorized,
        aud: api_domain.to_string(),
        iss: api_domain.to_string(),
        sub: TOKEN_SUBJECT.to_string(),
        iat: now.timestamp(),
        nbf: now.timestamp(),
        exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
    }
}

/// Sign claims with HS256.
pub fn sign_claims(claims: &TokenClaims, secret: &[u8]) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::TokenError("signing secret is not configured".into()));
    }
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
}

/// Generate a signed login token (HS256, 31 day expiry).
pub fn issue_token(grant: TokenGrant, api_domain: &str, secret: &[u8]) -> Result<String, AuthError> {
    let claims = build_claims(grant, api_domain, Utc::now());
    sign_claims(&claims, secret)
}

/// Verify a login token, returning the claims on success.
///
/// Signature, expiry, not-before, audience and issuer are all checked.
pub fn verify_token(token: &str, api_domain: &str, secret: &[u8]) -> Option<TokenClaims> {
    if secret.is_empty() {
        return None;
    }
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.set_audience(&[api_domain]);
    validation.set_issuer(&[api_domain]);
    validation.set_required_spec_claims(&["exp", "nbf", "aud", "iss", "sub"]);
    decode::<TokenClaims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}
