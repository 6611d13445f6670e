//! Engram API Routes
//!
//! - /engram/interactions - Automatic capture through the admission gate
//! - /engram/entries - Direct saves and deletes
//! - /engram/search, /engram/recent, /engram/stats - Retrieval
//! - /engram/admission - Gate status and tuning

use axum::{http::StatusCode, middleware, routing::get, Json, Router};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use engram::DomainError;

use crate::{auth, AppState};

pub mod admission;
pub mod memory;
pub mod swagger;

pub type ApiError = (StatusCode, String);

/// Map a domain failure onto an HTTP status
pub fn domain_error(error: DomainError) -> ApiError {
    let status = match &error {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Store(_) | DomainError::Classifier(_) => StatusCode::BAD_GATEWAY,
        DomainError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        DomainError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
    };
    if status.is_server_error() {
        tracing::error!("Request failed: {}", error);
    }
    (status, error.to_string())
}

#[derive(Serialize)]
struct HealthCheck {
    status: String,
    message: String,
    version: String,
}

async fn health_check() -> Json<HealthCheck> {
    Json(HealthCheck {
        status: "ok".to_string(),
        message: "Engram API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Full application router
pub fn app(state: AppState) -> Router {
    // Protected routes (require authentication)
    let protected_routes = Router::new()
        .merge(memory::router())
        .merge(admission::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let openapi = swagger::ApiDoc::openapi();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
