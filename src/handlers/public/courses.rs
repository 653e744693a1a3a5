use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;

use crate::backend::models::{Course, CourseFilter};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CoursesResponse {
    pub success: bool,
    pub courses: Vec<Course>,
}

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub success: bool,
    pub course: Course,
}

/// GET /api/courses?level=&tag= - published catalog
pub async fn courses_list(
    State(state): State<AppState>,
    Query(filter): Query<CourseFilter>,
) -> Result<Json<CoursesResponse>, ApiError> {
    let courses = state.catalog().list(filter).await?;
    Ok(Json(CoursesResponse {
        success: true,
        courses,
    }))
}

/// GET /api/courses/:slug - one published course
pub async fn course_get(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = state.catalog().get(&slug).await?;
    Ok(Json(CourseResponse {
        success: true,
        course,
    }))
}
