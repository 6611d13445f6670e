//! OpenAPI Documentation
//!
//! Centralized API documentation using utoipa.

use utoipa::OpenApi;

use engram::{
    AdmissionConfig, AdmissionConfigUpdate, AdmissionOutcome, AdmissionStatus, DirectSave,
    MemoryEntry, MemoryKind, MemorySource, MemoryView, RecentResponse, SearchMode,
    SearchResponse, SourceTool, StatsView,
};

use super::memory::{InteractionRequest, StoreHealthResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Memory endpoints
        super::memory::evaluate_interaction,
        super::memory::save_entry,
        super::memory::delete_entry,
        super::memory::search,
        super::memory::recent,
        super::memory::stats,
        super::memory::store_health,
        // Admission endpoints
        super::admission::get_status,
        super::admission::update_config,
    ),
    info(
        title = "Engram API",
        version = "0.1.0",
        description = "Knowledge memory for AI coding sessions.\n\nInteractions pass an admission gate before they are remembered; stored entries are served back through search and recent views.",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Memory", description = "Memory - Capture, search and curation"),
        (name = "Admission", description = "Admission - Gate status and tuning"),
    ),
    components(
        schemas(
            // Memory
            MemoryKind,
            SourceTool,
            SearchMode,
            MemorySource,
            MemoryEntry,
            MemoryView,
            InteractionRequest,
            DirectSave,
            SearchResponse,
            RecentResponse,
            StatsView,
            StoreHealthResponse,
            // Admission
            AdmissionOutcome,
            AdmissionStatus,
            AdmissionConfig,
            AdmissionConfigUpdate,
        )
    ),
)]
pub struct ApiDoc;
