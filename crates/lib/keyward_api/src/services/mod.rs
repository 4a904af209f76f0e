//! Services backing the request handlers.

pub mod auth;
pub mod captcha;
