pub mod auth_service;
pub mod course_service;
pub mod enrollment_service;
pub mod profile_service;
pub mod progress_service;

pub use auth_service::AuthService;
pub use course_service::{CourseService, RESERVED_SLUGS};
pub use enrollment_service::{EnrollInput, EnrollmentService};
pub use profile_service::{ProfileService, ProfileUpdateInput};
pub use progress_service::{ProgressInput, ProgressService};

use crate::backend::BackendError;

/// Failures of the learning services, before HTTP mapping
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Missing required field: {0}")]
    MissingInput(&'static str),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Profile not found")]
    ProfileNotFound,

    #[error("Course not found")]
    CourseNotFound,

    #[error("Already enrolled in this course")]
    AlreadyEnrolled,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Presence check for request strings. Blank counts as absent.
pub(crate) fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ServiceError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ServiceError::MissingInput(field))
}
