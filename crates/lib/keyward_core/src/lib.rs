//! # keyward_core
//!
//! Core login logic for Keyward: credential verification, account
//! selection, billing evaluation and login token issuance.

pub mod auth;
pub mod billing;
pub mod config;
pub mod migrate;
pub mod models;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
