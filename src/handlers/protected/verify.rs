use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::backend::models::UserRecord;
use crate::error::ApiError;
use crate::handlers::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub user: UserRecord,
    pub valid: bool,
}

/// POST /api/auth/verify - validate a token and return the merged user
///
/// Expected Input:
/// ```json
/// { "token": "string" }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "user": { "id": "uuid", "email": "...", "name": "...", "role": "student", ... },
///   "valid": true
/// }
/// ```
pub async fn verify_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let user = state.auth().verify(body.token.as_deref()).await?;
    Ok(Json(VerifyResponse { user, valid: true }))
}
