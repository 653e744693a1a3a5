#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use taxedu_api::backend::RestBackend;
use taxedu_api::config::{AppConfig, Secret};
use taxedu_api::middleware::RouteGuard;
use taxedu_api::router::build_router;
use taxedu_api::state::AppState;

pub const SERVICE_KEY: &str = "service-role-test-key";
pub const ANON_KEY: &str = "anon-test-key";

/// Fake hosted backend: identity, profiles and courses over HTTP.
#[derive(Default)]
pub struct MockBackend {
    users: Mutex<HashMap<String, Value>>,
    profiles: Mutex<HashMap<String, Value>>,
    courses: Mutex<Vec<Value>>,
    /// (path, apikey) for every request received
    requests: Mutex<Vec<(String, String)>>,
    course_queries: Mutex<Vec<HashMap<String, String>>>,
}

impl MockBackend {
    /// Register a token for a student with signup metadata and an empty profile.
    pub fn add_student(&self, token: &str, email: &str, full_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.users.lock().unwrap().insert(
            token.to_string(),
            json!({
                "id": id,
                "email": email,
                "email_confirmed_at": "2024-01-02T03:04:05Z",
                "user_metadata": { "full_name": full_name },
                "created_at": "2024-01-01T00:00:00Z"
            }),
        );
        self.profiles.lock().unwrap().insert(
            id.to_string(),
            json!({
                "id": id,
                "email": email,
                "full_name": null,
                "role": "student",
                "enrolled_courses": null,
                "course_progress": null
            }),
        );
        id
    }

    pub fn add_course(&self, slug: &str, published: bool) {
        self.add_tagged_course(slug, "beginner", &["tax"], published);
    }

    pub fn add_tagged_course(&self, slug: &str, level: &str, tags: &[&str], published: bool) {
        self.courses.lock().unwrap().push(json!({
            "id": format!("course-{}", slug),
            "slug": slug,
            "title": slug.replace('-', " "),
            "price": "49.99",
            "level": level,
            "tags": tags,
            "is_published": published
        }));
    }

    /// Query parameters of the most recent courses request.
    pub fn last_course_query(&self) -> Option<HashMap<String, String>> {
        self.course_queries.lock().unwrap().last().cloned()
    }

    pub fn profile(&self, id: Uuid) -> Option<Value> {
        self.profiles.lock().unwrap().get(&id.to_string()).cloned()
    }

    pub fn keys_used_for(&self, path: &str) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, key)| key.clone())
            .collect()
    }

    fn record(&self, path: &str, headers: &HeaderMap) {
        let key = headers
            .get("apikey")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.requests.lock().unwrap().push((path.to_string(), key));
    }
}

type Mock = Arc<MockBackend>;

fn eq_param(params: &HashMap<String, String>, name: &str) -> Option<String> {
    params.get(name)?.strip_prefix("eq.").map(str::to_string)
}

async fn auth_user(State(mock): State<Mock>, headers: HeaderMap) -> impl IntoResponse {
    mock.record("/auth/v1/user", &headers);
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default();

    match mock.users.lock().unwrap().get(token) {
        Some(user) => (StatusCode::OK, Json(user.clone())),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "msg": "invalid JWT" })),
        ),
    }
}

async fn auth_health(State(mock): State<Mock>, headers: HeaderMap) -> StatusCode {
    mock.record("/auth/v1/health", &headers);
    StatusCode::OK
}

async fn profiles_get(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    mock.record("/rest/v1/profiles", &headers);
    let rows: Vec<Value> = eq_param(&params, "id")
        .and_then(|id| mock.profiles.lock().unwrap().get(&id).cloned())
        .into_iter()
        .collect();
    Json(Value::Array(rows))
}

async fn profiles_patch(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(changes): Json<Value>,
) -> Json<Value> {
    mock.record("/rest/v1/profiles", &headers);
    let mut profiles = mock.profiles.lock().unwrap();
    let rows: Vec<Value> = eq_param(&params, "id")
        .and_then(|id| profiles.get_mut(&id))
        .map(|row| {
            if let (Some(row), Some(changes)) = (row.as_object_mut(), changes.as_object()) {
                for (key, value) in changes {
                    row.insert(key.clone(), value.clone());
                }
            }
            row.clone()
        })
        .into_iter()
        .collect();
    Json(Value::Array(rows))
}

async fn courses_get(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    mock.record("/rest/v1/courses", &headers);
    mock.course_queries.lock().unwrap().push(params.clone());

    let published_only = params.get("is_published").map(String::as_str) == Some("eq.true");
    let slug = eq_param(&params, "slug");
    let level = params.get("level").and_then(|v| v.strip_prefix("ilike."));
    let tag = params.get("tags").and_then(|v| contained_element(v));

    let rows: Vec<Value> = mock
        .courses
        .lock()
        .unwrap()
        .iter()
        .filter(|c| !published_only || c["is_published"] == true)
        .filter(|c| slug.as_deref().map_or(true, |s| c["slug"] == s))
        .filter(|c| {
            level.map_or(true, |l| {
                c["level"].as_str().is_some_and(|v| v.eq_ignore_ascii_case(l))
            })
        })
        .filter(|c| {
            tag.as_deref().map_or(true, |t| {
                c["tags"].as_array().is_some_and(|tags| tags.iter().any(|v| v == t))
            })
        })
        .cloned()
        .collect();
    Json(Value::Array(rows))
}

/// Single element of a `cs.{"..."}` containment filter.
fn contained_element(raw: &str) -> Option<String> {
    let inner = raw.strip_prefix("cs.{")?.strip_suffix('}')?;
    let quoted = inner.strip_prefix('"')?.strip_suffix('"')?;
    Some(quoted.replace("\\\"", "\"").replace("\\\\", "\\"))
}

fn mock_router(mock: Mock) -> Router {
    Router::new()
        .route("/auth/v1/user", get(auth_user))
        .route("/auth/v1/health", get(auth_health))
        .route("/rest/v1/profiles", get(profiles_get).patch(profiles_patch))
        .route("/rest/v1/courses", get(courses_get))
        .with_state(mock)
}

/// The API server running in-process against a mock backend.
pub struct TestApp {
    pub base_url: String,
    pub backend: Mock,
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn with extra configuration applied on top of the test defaults.
    pub async fn spawn_with(configure: impl FnOnce(&mut AppConfig)) -> Result<Self> {
        let backend: Mock = Arc::new(MockBackend::default());

        // Pick unused ports for isolation
        let backend_port = portpicker::pick_unused_port().context("failed to pick backend port")?;
        let backend_listener = tokio::net::TcpListener::bind(("127.0.0.1", backend_port)).await?;
        let backend_router = mock_router(backend.clone());
        tokio::spawn(async move {
            let _ = axum::serve(backend_listener, backend_router).await;
        });
        let backend_url = format!("http://127.0.0.1:{}", backend_port);

        let mut config = AppConfig::default();
        config.backend.url = backend_url.clone();
        config.backend.service_role_key = Secret::new(SERVICE_KEY);
        config.backend.anon_key = Secret::new(ANON_KEY);
        config.api.enable_request_logging = false;
        configure(&mut config);
        config.validate()?;

        let timeout = Duration::from_secs(5);
        let service = Arc::new(RestBackend::new(&backend_url, Secret::new(SERVICE_KEY), timeout)?);
        let anon = Arc::new(RestBackend::new(&backend_url, Secret::new(ANON_KEY), timeout)?);
        let app = build_router(
            AppState::from_backend(service),
            RouteGuard::new(anon, config.guard.clone()),
            &config,
        );

        let port = portpicker::pick_unused_port().context("failed to pick app port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let test_app = Self {
            base_url: format!("http://127.0.0.1:{}", port),
            backend,
        };
        test_app.wait_ready(Duration::from_secs(5)).await?;
        Ok(test_app)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// Client that reports redirects instead of following them.
pub fn no_redirect_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}
