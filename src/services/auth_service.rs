use std::sync::Arc;

use tracing::debug;

use super::{required, ServiceError};
use crate::backend::models::{IdentityUser, UserRecord};
use crate::backend::{BackendError, IdentityProvider, ProfileRepository};

/// Token verification against the backend identity service.
#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileRepository>,
}

impl AuthService {
    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { identity, profiles }
    }

    /// Resolve a token to its identity user. A rejected token is
    /// `InvalidToken`; any other backend failure passes through.
    pub async fn authenticate(&self, token: &str) -> Result<IdentityUser, ServiceError> {
        match self.identity.get_user(token).await {
            Ok(user) => Ok(user),
            Err(BackendError::TokenRejected) => Err(ServiceError::InvalidToken),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify a token and return the normalized user. Read-only.
    pub async fn verify(&self, token: Option<&str>) -> Result<UserRecord, ServiceError> {
        let token = required(token, "token")?;
        let user = self.authenticate(token).await?;

        let profile = self.profiles.find_by_id(user.id).await?;
        if profile.is_none() {
            debug!("No profile row for user {}, falling back to provider metadata", user.id);
        }

        Ok(UserRecord::merge(&user, profile.as_ref()))
    }
}
