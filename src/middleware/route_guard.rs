use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::backend::IdentityProvider;
use crate::config::GuardConfig;

/// Outcome of the per-request guard check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
}

/// Page gatekeeper. Holds the restricted-credential identity provider, never
/// the service-role one.
#[derive(Clone)]
pub struct RouteGuard {
    identity: Arc<dyn IdentityProvider>,
    config: Arc<GuardConfig>,
}

impl RouteGuard {
    pub fn new(identity: Arc<dyn IdentityProvider>, config: GuardConfig) -> Self {
        Self {
            identity,
            config: Arc::new(config),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.config.login_path
    }

    /// Excluded prefixes win over protected ones.
    pub fn is_protected(&self, path: &str) -> bool {
        if self.config.excluded_prefixes.iter().any(|p| under_prefix(path, p)) {
            return false;
        }
        self.config.protected_prefixes.iter().any(|p| under_prefix(path, p))
    }

    /// Token from the configured cookie, else from `Authorization: Bearer`.
    pub fn extract_token(&self, headers: &HeaderMap) -> Option<String> {
        let jar = CookieJar::from_headers(headers);
        jar.get(&self.config.token_cookie)
            .map(|cookie| cookie.value().trim().to_string())
            .filter(|token| !token.is_empty())
            .or_else(|| bearer_token(headers))
    }

    pub async fn decide(&self, path: &str, token: Option<&str>) -> GuardDecision {
        if !self.is_protected(path) {
            return GuardDecision::Allow;
        }

        let Some(token) = token else {
            tracing::debug!("No token for protected path {}", path);
            return GuardDecision::RedirectToLogin;
        };

        match self.identity.get_user(token).await {
            Ok(user) => {
                tracing::debug!("Guard allowed {} for user {}", path, user.id);
                GuardDecision::Allow
            }
            Err(e) => {
                tracing::warn!("Guard rejected token for {}: {}", path, e);
                GuardDecision::RedirectToLogin
            }
        }
    }
}

/// Middleware that redirects unauthenticated requests for protected pages
/// to the login page. Allowed requests are forwarded unmodified.
pub async fn route_guard(State(guard): State<RouteGuard>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let token = if guard.is_protected(&path) {
        guard.extract_token(request.headers())
    } else {
        None
    };

    match guard.decide(&path, token.as_deref()).await {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::RedirectToLogin => Redirect::temporary(guard.login_path()).into_response(),
    }
}

/// Extract the token from an `Authorization: Bearer` header
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Segment-aware prefix match: `/dashboard` covers `/dashboard/x` but not
/// `/dashboards`.
fn under_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}
