use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError, models::session::SessionResponse, state::AppState, utils::jwt::AccessClaims,
};

#[utoipa::path(
    get,
    path = "/api/admin/sessions",
    responses(
        (status = 200, description = "Snapshot of the session registry", body = [SessionResponse]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    ),
    tag = "admin"
)]
pub async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionResponse>> {
    let responses = state
        .authenticator
        .list_sessions()
        .into_iter()
        .map(|(id, record)| SessionResponse::from_record(id, record))
        .collect();
    Json(responses)
}

/// Revoking an unknown id succeeds so repeated calls are harmless.
#[utoipa::path(
    delete,
    path = "/api/admin/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session revoked"),
        (status = 400, description = "Empty session id"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    ),
    tag = "admin"
)]
pub async fn revoke_session(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let session_id = session_id.trim();
    if session_id.is_empty() {
        return Err(AppError::BadRequest("Session ID is required".into()));
    }

    state.authenticator.revoke_session(session_id);
    tracing::info!(admin = %claims.sub, session_id = %session_id, "admin_session_revoked");

    Ok(Json(json!({
        "message": "Session revoked",
        "session_id": session_id
    })))
}
