use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::backend::models::ProgressMap;
use crate::error::ApiError;
use crate::handlers::ApiJson;
use crate::services::{EnrollInput, ProgressInput};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub token: Option<String>,
    pub course_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollResponse {
    pub success: bool,
    pub enrolled_courses: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    pub token: Option<String>,
    pub course_id: Option<String>,
    pub progress: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub success: bool,
    pub course_progress: ProgressMap,
}

/// POST /api/courses/enroll - `{ token, courseId }`
///
/// Duplicate enrollment is a 400 with code `CONFLICT`, not a silent success.
pub async fn enroll_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<EnrollRequest>,
) -> Result<Json<EnrollResponse>, ApiError> {
    let enrolled_courses = state
        .enrollment()
        .enroll(EnrollInput {
            token: body.token,
            course_id: body.course_id,
        })
        .await?;

    Ok(Json(EnrollResponse {
        success: true,
        enrolled_courses,
    }))
}

/// POST /api/courses/progress - `{ token, courseId, progress }`
pub async fn progress_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ProgressRequest>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let course_progress = state
        .progress()
        .set_progress(ProgressInput {
            token: body.token,
            course_id: body.course_id,
            progress: body.progress,
        })
        .await?;

    Ok(Json(ProgressResponse {
        success: true,
        course_progress,
    }))
}
