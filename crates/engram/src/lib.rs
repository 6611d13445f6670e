//! Engram Domain Library
//!
//! Core types and use cases for the Engram knowledge-memory service: an
//! admission gate that decides which interactions are worth remembering, and
//! a retrieval facade that serves them back.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: MemoryEntry, ClassificationResult, AdmissionConfig
//!   - `value_objects/`: MemoryKind, SearchMode, SourceTool
//!   - `services/`: Fingerprint and text normalization
//!   - `errors/`: Domain-specific error types
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `repositories/`: MemoryStore
//!   - `services/`: ImportanceClassifier
//!
//! - **Application** (`application/`): AdmissionGate, RetrievalService and
//!   the MemoryHub context object that callers hold
//!
//! # Usage
//!
//! ```rust,ignore
//! use engram::{AdmissionConfig, MemoryHub, MemorySource, SourceTool};
//!
//! let hub = MemoryHub::new(classifier, store, AdmissionConfig::default());
//! hub.start();
//! let outcome = hub
//!     .evaluate_interaction(request, response, MemorySource::new(SourceTool::ClaudeCode))
//!     .await?;
//! ```

pub mod application;
pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use application::{
    window_period, AdmissionGate, AdmissionOutcome, AdmissionStatus, DirectSave,
    FingerprintSweeper, HealthReport, MemoryHub, MemoryView, RecentParams, RecentResponse,
    RetrievalService, SearchParams, SearchResponse, StatsView,
};
pub use domain::{
    AdmissionConfig, AdmissionConfigUpdate, ClassificationResult, DomainError, Fingerprint,
    MemoryEntry, MemoryKind, MemorySource, NewMemoryEntry, RawClassification, SearchMode,
    SearchResults, SourceTool, StoreHealth, StoreStats, MAX_DEDUP_WINDOW_MINUTES,
};
pub use ports::{ImportanceClassifier, MemoryStore, StoreQuery};
