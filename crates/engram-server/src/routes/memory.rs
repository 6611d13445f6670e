//! Memory Routes - Ingestion and retrieval

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use engram::{
    AdmissionOutcome, DirectSave, MemorySource, MemoryView, RecentParams, RecentResponse,
    SearchParams, SearchResponse, StatsView,
};

use super::{domain_error, ApiError};
use crate::AppState;

/// An interaction offered to the admission gate
#[derive(Debug, Deserialize, ToSchema)]
pub struct InteractionRequest {
    pub request: String,
    pub response: String,
    #[serde(default)]
    pub source: MemorySource,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Search text
    #[serde(default)]
    pub q: String,
    /// semantic | keyword | hybrid
    pub mode: Option<String>,
    /// Memory kind filter
    pub kind: Option<String>,
    /// Comma-separated tags
    pub tags: Option<String>,
    /// 1-50, default 10
    pub limit: Option<i64>,
}

impl From<SearchQuery> for SearchParams {
    fn from(query: SearchQuery) -> Self {
        SearchParams {
            query: query.q,
            mode: query.mode,
            kind: query.kind,
            tags: query
                .tags
                .map(|t| t.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            limit: query.limit,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentQuery {
    /// 1-50, default 10
    pub limit: Option<i64>,
    /// Memory kind filter
    pub kind: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoreHealthResponse {
    pub ok: bool,
    /// Store version, when reachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub server_version: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/engram/interactions", post(evaluate_interaction))
        .route("/engram/entries", post(save_entry))
        .route("/engram/entries/:id", delete(delete_entry))
        .route("/engram/search", get(search))
        .route("/engram/recent", get(recent))
        .route("/engram/stats", get(stats))
        .route("/engram/store/health", get(store_health))
}

/// Offer an interaction for automatic memory capture
#[utoipa::path(
    post,
    path = "/engram/interactions",
    request_body = InteractionRequest,
    responses(
        (status = 200, description = "Admission decision", body = AdmissionOutcome),
        (status = 502, description = "Store rejected the write"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "Memory"
)]
pub async fn evaluate_interaction(
    State(state): State<AppState>,
    Json(payload): Json<InteractionRequest>,
) -> Result<Json<AdmissionOutcome>, ApiError> {
    let outcome = state
        .hub
        .evaluate_interaction(&payload.request, &payload.response, payload.source)
        .await
        .map_err(domain_error)?;

    Ok(Json(outcome))
}

/// Save an entry without classification
#[utoipa::path(
    post,
    path = "/engram/entries",
    request_body = DirectSave,
    responses(
        (status = 201, description = "Entry saved", body = MemoryView),
        (status = 400, description = "Invalid entry")
    ),
    tag = "Memory"
)]
pub async fn save_entry(
    State(state): State<AppState>,
    Json(payload): Json<DirectSave>,
) -> Result<(StatusCode, Json<MemoryView>), ApiError> {
    let entry = state
        .hub
        .save_directly(payload)
        .await
        .map_err(domain_error)?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// Delete an entry
#[utoipa::path(
    delete,
    path = "/engram/entries/{id}",
    params(("id" = String, Path, description = "Entry ID")),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 404, description = "Entry not found")
    ),
    tag = "Memory"
)]
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.hub.delete(&id).await.map_err(domain_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Search memories
#[utoipa::path(
    get,
    path = "/engram/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching memories", body = SearchResponse),
        (status = 400, description = "Invalid query, mode or kind")
    ),
    tag = "Memory"
)]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let response = state
        .hub
        .search(query.into())
        .await
        .map_err(domain_error)?;

    Ok(Json(response))
}

/// Most recent memories, newest first
#[utoipa::path(
    get,
    path = "/engram/recent",
    params(RecentQuery),
    responses(
        (status = 200, description = "Recent memories", body = RecentResponse),
        (status = 400, description = "Invalid kind")
    ),
    tag = "Memory"
)]
pub async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<RecentResponse>, ApiError> {
    let params = RecentParams {
        limit: query.limit,
        kind: query.kind,
    };
    let response = state.hub.recent(params).await.map_err(domain_error)?;
    Ok(Json(response))
}

/// Store statistics
#[utoipa::path(
    get,
    path = "/engram/stats",
    responses(
        (status = 200, description = "Store statistics", body = StatsView),
        (status = 503, description = "Store unavailable")
    ),
    tag = "Memory"
)]
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsView>, ApiError> {
    let stats = state.hub.stats().await.map_err(domain_error)?;
    Ok(Json(stats))
}

/// Store reachability
#[utoipa::path(
    get,
    path = "/engram/store/health",
    responses(
        (status = 200, description = "Store health", body = StoreHealthResponse)
    ),
    tag = "Health"
)]
pub async fn store_health(State(state): State<AppState>) -> Json<StoreHealthResponse> {
    let report = state.hub.health().await;
    Json(StoreHealthResponse {
        ok: report.ok,
        version: report.version,
        server_version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
