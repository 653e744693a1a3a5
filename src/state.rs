use std::sync::Arc;

use crate::backend::{CourseRepository, IdentityProvider, ProfileRepository};
use crate::services::{AuthService, CourseService, EnrollmentService, ProfileService, ProgressService};

/// Shared application state passed to every handler via axum `State`.
///
/// Holds the elevated-credential backend handles; the route guard carries its
/// own restricted-credential identity provider.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub courses: Arc<dyn CourseRepository>,
}

impl AppState {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileRepository>,
        courses: Arc<dyn CourseRepository>,
    ) -> Self {
        Self {
            identity,
            profiles,
            courses,
        }
    }

    /// Use one backend for identity, profiles and courses.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: IdentityProvider + ProfileRepository + CourseRepository + 'static,
    {
        Self {
            identity: backend.clone(),
            profiles: backend.clone(),
            courses: backend,
        }
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.identity.clone(), self.profiles.clone())
    }

    pub fn enrollment(&self) -> EnrollmentService {
        EnrollmentService::new(self.auth(), self.profiles.clone())
    }

    pub fn progress(&self) -> ProgressService {
        ProgressService::new(self.auth(), self.profiles.clone())
    }

    pub fn profile(&self) -> ProfileService {
        ProfileService::new(self.auth(), self.profiles.clone())
    }

    pub fn catalog(&self) -> CourseService {
        CourseService::new(self.courses.clone())
    }
}
