//! Route paths.

pub const POST_AUTHENTICATION_LOGIN: &str = "/authentication/login";
pub const GET_AUTHENTICATION_SESSION: &str = "/authentication/session";
