use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::{required, AuthService, ServiceError};
use crate::backend::models::{clamp_progress, ProfileChanges, ProgressMap};
use crate::backend::ProfileRepository;

pub struct ProgressInput {
    pub token: Option<String>,
    pub course_id: Option<String>,
    /// `None` only when the field was absent; `Some(0.0)` is a real value.
    pub progress: Option<f64>,
}

/// Stores per-course completion on the profile row.
pub struct ProgressService {
    auth: AuthService,
    profiles: Arc<dyn ProfileRepository>,
}

impl ProgressService {
    pub fn new(auth: AuthService, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { auth, profiles }
    }

    /// Clamp and store progress for one course, returning the whole map.
    /// Repeated writes for the same course simply overwrite.
    pub async fn set_progress(&self, input: ProgressInput) -> Result<ProgressMap, ServiceError> {
        let token = required(input.token.as_deref(), "token")?;
        let course_id = required(input.course_id.as_deref(), "courseId")?;
        let progress = input.progress.ok_or(ServiceError::MissingInput("progress"))?;

        let user = self.auth.authenticate(token).await?;
        let profile = self
            .profiles
            .find_by_id(user.id)
            .await?
            .ok_or(ServiceError::ProfileNotFound)?;

        let clamped = clamp_progress(progress);
        let mut course_progress = profile.course_progress;
        course_progress.insert(course_id.to_string(), clamped);

        let mut changes = ProfileChanges::at(Utc::now());
        changes.course_progress = Some(course_progress);

        let updated = self
            .profiles
            .update(user.id, &changes)
            .await?
            .ok_or(ServiceError::ProfileNotFound)?;

        info!("Progress for user {} on {} set to {}", user.id, course_id, clamped);
        Ok(updated.course_progress)
    }
}
