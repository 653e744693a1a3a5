use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::{required, AuthService, ServiceError};
use crate::backend::models::ProfileChanges;
use crate::backend::ProfileRepository;

pub struct EnrollInput {
    pub token: Option<String>,
    pub course_id: Option<String>,
}

/// Appends course ids to the profile's embedded enrollment list.
///
/// Read-check-write without a transaction: two concurrent enrollments for
/// the same user can overwrite each other's list.
pub struct EnrollmentService {
    auth: AuthService,
    profiles: Arc<dyn ProfileRepository>,
}

impl EnrollmentService {
    pub fn new(auth: AuthService, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { auth, profiles }
    }

    /// Enroll the token's user. A duplicate enrollment is rejected with
    /// `AlreadyEnrolled` and leaves the stored list untouched.
    pub async fn enroll(&self, input: EnrollInput) -> Result<Vec<String>, ServiceError> {
        let token = required(input.token.as_deref(), "token")?;
        let course_id = required(input.course_id.as_deref(), "courseId")?;

        let user = self.auth.authenticate(token).await?;
        let profile = self
            .profiles
            .find_by_id(user.id)
            .await?
            .ok_or(ServiceError::ProfileNotFound)?;

        if profile.is_enrolled(course_id) {
            info!("User {} already enrolled in {}", user.id, course_id);
            return Err(ServiceError::AlreadyEnrolled);
        }

        let mut enrolled = profile.enrolled_courses;
        enrolled.push(course_id.to_string());

        let mut changes = ProfileChanges::at(Utc::now());
        changes.enrolled_courses = Some(enrolled);

        let updated = self
            .profiles
            .update(user.id, &changes)
            .await?
            .ok_or(ServiceError::ProfileNotFound)?;

        info!("Enrolled user {} in course {}", user.id, course_id);
        Ok(updated.enrolled_courses)
    }
}
