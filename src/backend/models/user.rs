use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::null_as_default;
use super::profile::{Profile, ProgressMap};

/// Display name used when neither the profile nor the provider metadata has one.
pub const FALLBACK_NAME: &str = "User";

/// Identity record returned by the backend's auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_metadata: UserMetadata,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Free-form metadata captured at signup. Only the keys used for
/// normalization are read; everything else is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Student,
    Instructor,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Parse a stored role string; unknown values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "student" => Some(Role::Student),
            "instructor" => Some(Role::Instructor),
            "admin" => Some(Role::Admin),
            "super_admin" | "superadmin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }
}

/// Normalized user returned to clients: identity merged with profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub email_confirmed: bool,
    pub enrolled_courses: Vec<String>,
    pub course_progress: ProgressMap,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Field precedence: profile column, then provider metadata, then the
    /// hardcoded fallback.
    pub fn merge(identity: &IdentityUser, profile: Option<&Profile>) -> Self {
        let metadata = &identity.user_metadata;

        let name = profile
            .and_then(|p| present(&p.full_name))
            .or_else(|| present(&metadata.full_name))
            .or_else(|| present(&metadata.name))
            .unwrap_or(FALLBACK_NAME)
            .to_string();

        let role = profile
            .and_then(|p| p.role.as_deref())
            .and_then(Role::parse)
            .or_else(|| metadata.role.as_deref().and_then(Role::parse))
            .unwrap_or_default();

        let avatar = profile
            .and_then(|p| present(&p.avatar_url))
            .or_else(|| present(&metadata.avatar_url))
            .map(str::to_string);

        Self {
            id: identity.id,
            email: profile
                .and_then(|p| present(&p.email))
                .or_else(|| present(&identity.email))
                .map(str::to_string),
            name,
            role,
            avatar,
            phone: profile.and_then(|p| present(&p.phone)).map(str::to_string),
            bio: profile.and_then(|p| present(&p.bio)).map(str::to_string),
            email_confirmed: identity.email_confirmed_at.is_some(),
            enrolled_courses: profile.map(|p| p.enrolled_courses.clone()).unwrap_or_default(),
            course_progress: profile.map(|p| p.course_progress.clone()).unwrap_or_default(),
            created_at: profile.and_then(|p| p.created_at).or(identity.created_at),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
