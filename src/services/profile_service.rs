use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::{required, AuthService, ServiceError};
use crate::backend::models::{ProfileChanges, UserRecord};
use crate::backend::ProfileRepository;

const MAX_NAME_CHARS: usize = 120;
const MAX_BIO_CHARS: usize = 2000;
const MAX_PHONE_CHARS: usize = 32;

/// Self-service profile edits. Role, enrollment and progress are not
/// reachable from here.
pub struct ProfileUpdateInput {
    pub token: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

pub struct ProfileService {
    auth: AuthService,
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    pub fn new(auth: AuthService, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { auth, profiles }
    }

    pub async fn update(&self, input: ProfileUpdateInput) -> Result<UserRecord, ServiceError> {
        let token = required(input.token.as_deref(), "token")?;
        let changes = validate_changes(&input)?;

        let user = self.auth.authenticate(token).await?;
        if self.profiles.find_by_id(user.id).await?.is_none() {
            return Err(ServiceError::ProfileNotFound);
        }

        let updated = self
            .profiles
            .update(user.id, &changes)
            .await?
            .ok_or(ServiceError::ProfileNotFound)?;

        info!("Profile updated for user {}", user.id);
        Ok(UserRecord::merge(&user, Some(&updated)))
    }
}

fn validate_changes(input: &ProfileUpdateInput) -> Result<ProfileChanges, ServiceError> {
    if input.full_name.is_none()
        && input.avatar_url.is_none()
        && input.phone.is_none()
        && input.bio.is_none()
    {
        return Err(ServiceError::MissingInput("fullName, avatarUrl, phone or bio"));
    }

    let mut changes = ProfileChanges::at(Utc::now());

    if let Some(name) = input.full_name.as_deref().map(str::trim) {
        if name.is_empty() {
            return Err(ServiceError::InvalidInput("fullName cannot be empty".to_string()));
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(ServiceError::InvalidInput(format!(
                "fullName must be at most {} characters",
                MAX_NAME_CHARS
            )));
        }
        changes.full_name = Some(name.to_string());
    }

    if let Some(avatar) = input.avatar_url.as_deref().map(str::trim) {
        let valid = url::Url::parse(avatar)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            return Err(ServiceError::InvalidInput(
                "avatarUrl must be an http(s) URL".to_string(),
            ));
        }
        changes.avatar_url = Some(avatar.to_string());
    }

    if let Some(phone) = input.phone.as_deref().map(str::trim) {
        let allowed = phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
        if !allowed || phone.chars().count() > MAX_PHONE_CHARS {
            return Err(ServiceError::InvalidInput("phone is not a valid phone number".to_string()));
        }
        changes.phone = Some(phone.to_string());
    }

    if let Some(bio) = input.bio.as_deref().map(str::trim) {
        if bio.chars().count() > MAX_BIO_CHARS {
            return Err(ServiceError::InvalidInput(format!(
                "bio must be at most {} characters",
                MAX_BIO_CHARS
            )));
        }
        changes.bio = Some(bio.to_string());
    }

    Ok(changes)
}
