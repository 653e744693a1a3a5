use std::sync::Arc;

use super::{required, ServiceError};
use crate::backend::models::{Course, CourseFilter};
use crate::backend::CourseRepository;

/// Path segments under `/api/courses/` owned by write routes. A course with
/// one of these slugs cannot be addressed by `GET /api/courses/:slug`.
pub const RESERVED_SLUGS: &[&str] = &["enroll", "progress"];

/// Public course catalog. Unpublished courses are never returned.
pub struct CourseService {
    courses: Arc<dyn CourseRepository>,
}

impl CourseService {
    pub fn new(courses: Arc<dyn CourseRepository>) -> Self {
        Self { courses }
    }

    pub async fn list(&self, filter: CourseFilter) -> Result<Vec<Course>, ServiceError> {
        let filter = filter.normalized();
        Ok(self.courses.list_published(&filter).await?)
    }

    pub async fn get(&self, slug: &str) -> Result<Course, ServiceError> {
        let slug = required(Some(slug), "slug")?;
        if RESERVED_SLUGS.contains(&slug) {
            tracing::warn!("Course lookup with reserved slug {}", slug);
            return Err(ServiceError::CourseNotFound);
        }
        self.courses
            .find_published_by_slug(slug)
            .await?
            .ok_or(ServiceError::CourseNotFound)
    }
}
