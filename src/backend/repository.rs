use async_trait::async_trait;
use uuid::Uuid;

use super::models::{Course, CourseFilter, IdentityUser, Profile, ProfileChanges};
use super::BackendError;

/// Resolves access tokens to identity users.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fails with [`BackendError::TokenRejected`] for invalid or expired tokens.
    async fn get_user(&self, access_token: &str) -> Result<IdentityUser, BackendError>;

    /// Cheap reachability probe for health reporting.
    async fn ping(&self) -> Result<(), BackendError>;
}

/// Repository for the `profiles` table.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, BackendError>;

    /// Patch a profile row. Returns the updated row, or `None` if no row matched.
    async fn update(&self, id: Uuid, changes: &ProfileChanges) -> Result<Option<Profile>, BackendError>;
}

/// Read-only repository for the `courses` table.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn list_published(&self, filter: &CourseFilter) -> Result<Vec<Course>, BackendError>;

    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Course>, BackendError>;
}
