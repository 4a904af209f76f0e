//! Authentication and authorization logic.
//!
//! Provides credential hashing, login token management, the credential store
//! seam and the login decision engine that ties them together.

pub mod hasher;
pub mod jwt;
pub mod login;
pub mod queries;

use thiserror::Error;

use crate::billing::BillingError;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid credentials")]
    CredentialError,

    #[error("Login has no linked accounts")]
    NoLinkedAccounts,

    #[error("Unsupported billing status: {0}")]
    UnsupportedBillingStatus(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Billing error: {0}")]
    BillingError(#[from] BillingError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure categories handed back to the caller of the login flow.
///
/// Mapping these to transport status codes is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    InvalidCredentials,
    NoLinkedAccounts,
    UnsupportedBillingStatus,
    Infrastructure,
}

impl AuthError {
    /// Categorize this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            AuthError::ValidationError(_) => FailureKind::InvalidInput,
            AuthError::CredentialError => FailureKind::InvalidCredentials,
            AuthError::NoLinkedAccounts => FailureKind::NoLinkedAccounts,
            AuthError::UnsupportedBillingStatus(_) => FailureKind::UnsupportedBillingStatus,
            AuthError::TokenError(_)
            | AuthError::DbError(_)
            | AuthError::BillingError(_)
            | AuthError::Internal(_) => FailureKind::Infrastructure,
        }
    }

    /// Message that is safe to show to the client.
    ///
    /// Only validation messages are passed through verbatim; everything else
    /// collapses to a fixed string so internals never leak.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::ValidationError(msg) => msg.clone(),
            AuthError::CredentialError => "invalid email and password".into(),
            AuthError::NoLinkedAccounts => "user has no accounts".into(),
            AuthError::UnsupportedBillingStatus(_) => {
                "invalid subscription status, contact support".into()
            }
            _ => "failed to authenticate".into(),
        }
    }
}
