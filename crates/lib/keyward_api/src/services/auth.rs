//! Authentication service — turns login outcomes into API responses.

use keyward_core::auth::login::{LoginEngine, Outcome};
use keyward_core::models::auth::TokenClaims;

use crate::error::{AppError, AppResult};
use crate::models::{LoginResponse, SessionResponse};

/// Authenticate with email + password.
pub async fn login(engine: &LoginEngine, email: &str, password: &str) -> AppResult<LoginResponse> {
    outcome_to_response(engine.login(email, password).await)
}

/// Map an engine outcome onto the login response body.
pub fn outcome_to_response(outcome: Outcome) -> AppResult<LoginResponse> {
    match outcome {
        Outcome::Authenticated { token } => Ok(LoginResponse {
            token,
            next_url: None,
            users: None,
        }),
        Outcome::AuthenticatedNeedsSubscription { token, next_url } => Ok(LoginResponse {
            token,
            next_url: Some(next_url),
            users: None,
        }),
        Outcome::Disambiguation { token, users } => Ok(LoginResponse {
            token,
            next_url: None,
            users: Some(users),
        }),
        Outcome::Failure { kind, message } => Err(AppError::from_failure(kind, message)),
    }
}

/// Summarize verified token claims.
pub fn session_summary(claims: &TokenClaims) -> SessionResponse {
    SessionResponse {
        login_id: claims.login_id,
        user_id: claims.user_id,
        account_id: claims.account_id,
        authorized: claims.authorized,
        account_scoped: claims.is_account_scoped(),
        expires_at: claims.exp,
    }
}
