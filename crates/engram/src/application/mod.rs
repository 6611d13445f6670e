//! Application Layer (Use Cases)
//!
//! Orchestrates domain operations and coordinates between
//! the classifier and store ports.

pub mod admission;
mod hub;
mod ledger;
pub mod retrieval;
mod sweeper;

pub use admission::{
    classify_or_reject, AdmissionGate, AdmissionOutcome, AdmissionStatus, DEFAULT_SESSION_KEY,
};
pub use hub::MemoryHub;
pub use retrieval::{
    clamp_limit, DirectSave, HealthReport, MemoryView, RecentParams, RecentResponse,
    RetrievalService, SearchParams, SearchResponse, StatsView,
};
pub use sweeper::{window_period, FingerprintSweeper};
