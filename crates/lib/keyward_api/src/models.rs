//! Request and response bodies for the HTTP API.

use keyward_core::models::auth::User;
use serde::{Deserialize, Serialize};

/// `POST /authentication/login` body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub captcha: Option<String>,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Set when the account needs a subscription before it can be used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
    /// Set when the login must pick one of several accounts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
}

/// `GET /authentication/session` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub login_id: u64,
    pub user_id: u64,
    pub account_id: u64,
    pub authorized: bool,
    pub account_scoped: bool,
    pub expires_at: i64,
}

/// Error body returned for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
