use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::backend::models::UserRecord;
use crate::error::ApiError;
use crate::handlers::ApiJson;
use crate::services::ProfileUpdateInput;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub token: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    pub success: bool,
    pub user: UserRecord,
}

/// PATCH /api/profile - self-service edit of name, avatar, phone and bio
pub async fn profile_patch(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ProfileUpdateRequest>,
) -> Result<Json<ProfileUpdateResponse>, ApiError> {
    let user = state
        .profile()
        .update(ProfileUpdateInput {
            token: body.token,
            full_name: body.full_name,
            avatar_url: body.avatar_url,
            phone: body.phone,
            bio: body.bio,
        })
        .await?;

    Ok(Json(ProfileUpdateResponse { success: true, user }))
}
