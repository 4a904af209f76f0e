//! Authentication request handlers.

use axum::extract::State;
use axum::{Extension, Json};
use tracing::warn;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{LoginRequest, LoginResponse, SessionResponse};
use crate::services::auth;

/// `POST /authentication/login` — authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    if let Err(e) = state.captcha.verify(body.captcha.as_deref()).await {
        warn!(error = %e, "captcha verification failed");
        return Err(AppError::Validation("valid ReCAPTCHA is required".into()));
    }

    let resp = auth::login(&state.engine, &body.email, &body.password).await?;
    Ok(Json(resp))
}

/// `GET /authentication/session` — describe the presented token.
pub async fn session_handler(
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<SessionResponse>> {
    Ok(Json(auth::session_summary(&user.0)))
}
