//! # keyward_api
//!
//! HTTP API library for Keyward.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use keyward_core::auth::login::LoginEngine;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::auth;
use crate::services::captcha::CaptchaVerifier;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Login decision engine.
    pub engine: Arc<LoginEngine>,
    /// Captcha check run before every login.
    pub captcha: Arc<dyn CaptchaVerifier>,
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new().route(routes::POST_AUTHENTICATION_LOGIN, post(auth::login_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::GET_AUTHENTICATION_SESSION, get(auth::session_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
