use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use super::models::{Course, CourseFilter, IdentityUser, Profile, ProfileChanges};
use super::repository::{CourseRepository, IdentityProvider, ProfileRepository};
use super::BackendError;
use crate::config::Secret;

const PROFILES_TABLE: &str = "rest/v1/profiles";
const COURSES_TABLE: &str = "rest/v1/courses";

/// REST client for the hosted backend, bound to one credential level.
///
/// Build one with the service-role key for server-side handlers and a second
/// with the anon key for the route guard. The client is cheap to clone.
#[derive(Clone)]
pub struct RestBackend {
    http: Client,
    base_url: Url,
    api_key: Secret,
}

impl RestBackend {
    pub fn new(base_url: &str, api_key: Secret, timeout: Duration) -> Result<Self, BackendError> {
        let mut url = Url::parse(base_url)
            .map_err(|e| BackendError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        // Url::join drops the last path segment unless it ends with a slash
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: url,
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Table request authorized as the key owner; row-level policies for that
    /// role apply on the backend.
    fn table_request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", self.api_key.expose())
            .bearer_auth(self.api_key.expose())
            .header(header::ACCEPT, "application/json")
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn first_row<T: DeserializeOwned>(response: Response) -> Result<Option<T>, BackendError> {
        let rows: Vec<T> = Self::read_json(response).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl IdentityProvider for RestBackend {
    async fn get_user(&self, access_token: &str) -> Result<IdentityUser, BackendError> {
        // A token that cannot travel in a header is rejected, not a transport failure
        let bearer = header::HeaderValue::from_str(&format!("Bearer {}", access_token)).map_err(|_| {
            debug!("Token is not a valid header value");
            BackendError::TokenRejected
        })?;

        let response = self
            .http
            .get(self.endpoint("auth/v1/user")?)
            .header("apikey", self.api_key.expose())
            .header(header::AUTHORIZATION, bearer)
            .send()
            .await?;

        match response.status() {
            StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::NOT_FOUND => {
                debug!("Identity service rejected token with {}", response.status());
                Err(BackendError::TokenRejected)
            }
            _ => Self::read_json(response).await,
        }
    }

    async fn ping(&self) -> Result<(), BackendError> {
        let response = self
            .http
            .get(self.endpoint("auth/v1/health")?)
            .header("apikey", self.api_key.expose())
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Status {
                status: response.status().as_u16(),
                body: String::new(),
            })
        }
    }
}

#[async_trait]
impl ProfileRepository for RestBackend {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, BackendError> {
        let mut url = self.endpoint(PROFILES_TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("id", &format!("eq.{}", id))
            .append_pair("limit", "1");

        let response = self.table_request(Method::GET, url).send().await?;
        Self::first_row(response).await
    }

    async fn update(&self, id: Uuid, changes: &ProfileChanges) -> Result<Option<Profile>, BackendError> {
        let mut url = self.endpoint(PROFILES_TABLE)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));

        let response = self
            .table_request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(changes)
            .send()
            .await?;

        let updated = Self::first_row(response).await?;
        if updated.is_none() {
            warn!("Profile update for {} matched no rows", id);
        }
        Ok(updated)
    }
}

#[async_trait]
impl CourseRepository for RestBackend {
    async fn list_published(&self, filter: &CourseFilter) -> Result<Vec<Course>, BackendError> {
        let mut url = self.endpoint(COURSES_TABLE)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("select", "*")
                .append_pair("is_published", "eq.true")
                .append_pair("order", "created_at.desc");
            if let Some(level) = &filter.level {
                query.append_pair("level", &format!("ilike.{}", level));
            }
            if let Some(tag) = &filter.tag {
                query.append_pair("tags", &format!("cs.{{{}}}", array_element(tag)));
            }
        }

        let response = self.table_request(Method::GET, url).send().await?;
        Self::read_json(response).await
    }

    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Course>, BackendError> {
        let mut url = self.endpoint(COURSES_TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("slug", &format!("eq.{}", slug))
            .append_pair("is_published", "eq.true")
            .append_pair("limit", "1");

        let response = self.table_request(Method::GET, url).send().await?;
        Self::first_row(response).await
    }
}

/// Quote one element of a backend array literal (`{"a b"}`).
fn array_element(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}
