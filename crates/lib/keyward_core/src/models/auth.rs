//! Authentication domain models.
//!
//! These are internal domain models; the HTTP layer defines its own
//! request/response shapes in `keyward_api::models`.

use serde::{Deserialize, Serialize};

/// Authorization boundary. Billing is evaluated per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub account_id: u64,
}

/// A usable account binding for a login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: u64,
    pub login_id: u64,
    pub account_id: u64,
    pub account: Account,
}

/// The authentication anchor ("login"), with every user linked to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub login_id: u64,
    pub email: String,
    pub password_hash: String,
    pub users: Vec<User>,
}

/// JWT claims embedded in login tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Login (principal) that authenticated.
    #[serde(rename = "loginId")]
    pub login_id: u64,
    /// Selected user, `0` when none is selected yet.
    #[serde(rename = "userId")]
    pub user_id: u64,
    /// Selected account, `0` when none is selected yet.
    #[serde(rename = "accountId")]
    pub account_id: u64,
    /// Whether the account may be used (billing permitting).
    pub authorized: bool,
    /// Audience — the API domain.
    pub aud: String,
    /// Issuer — the API domain.
    pub iss: String,
    /// Fixed service subject.
    pub sub: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Not before (unix timestamp).
    pub nbf: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

impl TokenClaims {
    /// True when the token is bound to a concrete user and account.
    ///
    /// Tokens issued for account selection carry zeros in both fields and may
    /// only reach endpoints that are not account specific.
    pub fn is_account_scoped(&self) -> bool {
        self.user_id != 0 && self.account_id != 0
    }
}
