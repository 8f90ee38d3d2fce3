use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use tablekeeper_core::{AppError, NonEmptyString, UserIdentity};
use tower_sessions::Session;
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::state::AppState;

use super::{SESSION_CREATED_AT_KEY, SESSION_USER_KEY};

#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    pub subject: String,
    pub token: String,
}

/// Signs in an operator with the shared bootstrap token and grants them every permission.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<StatusCode> {
    if payload.token != state.bootstrap_token {
        warn!(subject = %payload.subject, "bootstrap login rejected");
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let subject: String = NonEmptyString::new(payload.subject.trim())?.into();

    state
        .authorization_service
        .ensure_operator(subject.as_str())
        .await?;

    let identity = UserIdentity::new(subject.clone());

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    info!(subject = %subject, "operator signed in");
    Ok(StatusCode::NO_CONTENT)
}
