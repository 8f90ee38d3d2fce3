use axum::Json;
use axum::extract::{Extension, State};
use tablekeeper_application::{AuthContext, anti_forgery};
use tablekeeper_core::{AppError, UserIdentity};
use tower_sessions::Session;
use tracing::warn;

use crate::auth::SESSION_FORM_TOKEN_KEY;
use crate::dto::{
    TableActionRequest, TableActionResponse, TableInventoryResponse, inactive_table_listing,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// Lists inactive tables and issues a fresh action token for the session.
pub async fn list_tables_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    session: Session,
) -> ApiResult<Json<TableInventoryResponse>> {
    let tables = state.inventory_service.list_inactive_tables(&user).await?;

    let form_token = anti_forgery::issue_token()?;
    session
        .insert(SESSION_FORM_TOKEN_KEY, form_token.as_str())
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist action token: {error}")))?;

    Ok(Json(TableInventoryResponse {
        tables: inactive_table_listing(tables),
        form_token,
    }))
}

/// Runs one truncate/drop request and returns the report with a refreshed listing.
pub async fn table_action_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    session: Session,
    Json(payload): Json<TableActionRequest>,
) -> ApiResult<Json<TableActionResponse>> {
    let (submitted_token, request) = payload.into_action_request()?;
    let session_token = session
        .get::<String>(SESSION_FORM_TOKEN_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read action token: {error}")))?;

    let context = AuthContext::new(user, session_token, submitted_token);
    let report = state
        .maintenance_service
        .handle_request(&context, request)
        .await?;

    // Statements already ran, so a failed refresh must not hide the report.
    let response = match state.inventory_service.find_inactive_tables().await {
        Ok(tables) => TableActionResponse::new(&report, tables),
        Err(error) => {
            warn!(error = %error, "failed to refresh inactive tables after maintenance");
            TableActionResponse::without_listing(
                &report,
                "inactive table listing could not be refreshed",
            )
        }
    };

    Ok(Json(response))
}
