use std::any::Any;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::handlers::{protected, public};
use crate::middleware::{route_guard, RouteGuard};
use crate::state::AppState;

/// Assemble the full application: API routes, optional static pages, the
/// route guard and the global layers.
pub fn build_router(state: AppState, guard: RouteGuard, config: &AppConfig) -> Router {
    let mut router = Router::new()
        // Public
        .route("/health", get(public::health))
        .merge(catalog_routes())
        // Token-in-body API
        .merge(auth_routes())
        .merge(learning_routes());

    if let Some(dir) = &config.server.static_dir {
        tracing::info!("Serving static pages from {}", dir);
        router = router.fallback_service(ServeDir::new(dir));
    }

    let mut app = router
        .with_state(state)
        .layer(middleware::from_fn_with_state(guard, route_guard))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.layer(cors_layer(config))
        .layer(CatchPanicLayer::custom(panic_response))
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/courses", get(public::courses_list))
        .route("/api/courses/:slug", get(public::course_get))
}

fn auth_routes() -> Router<AppState> {
    Router::new().route("/api/auth/verify", post(protected::verify_post))
}

fn learning_routes() -> Router<AppState> {
    Router::new()
        .route("/api/courses/enroll", post(protected::enroll_post))
        .route("/api/courses/progress", post(protected::progress_post))
        .route("/api/profile", patch(protected::profile_patch))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.security.allow_any_origin {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": "Internal server error",
            "code": "INTERNAL_SERVER_ERROR"
        })),
    )
        .into_response()
}
