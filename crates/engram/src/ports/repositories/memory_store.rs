//! Memory Store Port
//!
//! Abstract interface for the durable collaborator that owns memory entries.
//! The store assigns ids and timestamps and defines search ranking.

use async_trait::async_trait;

use crate::domain::{
    errors::DomainError, MemoryEntry, MemoryKind, NewMemoryEntry, SearchMode, SearchResults,
    StoreHealth, StoreStats,
};

/// Validated search request handed to the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoreQuery {
    pub query: String,
    pub mode: SearchMode,
    /// Filter by kind
    pub kind: Option<MemoryKind>,
    /// Filter by tags (normalized)
    pub tags: Vec<String>,
    /// Already clamped to the allowed range
    pub limit: usize,
}

/// Repository interface for memory entries
///
/// Every call may fail with `Unavailable`, `Timeout` or `Store` errors.
/// Implementations must bound each call with a timeout.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Persist an entry and return it with its assigned id and timestamp
    async fn save(&self, entry: NewMemoryEntry) -> Result<MemoryEntry, DomainError>;

    /// Search entries. `Hybrid` returns the union of semantic and keyword
    /// matches, de-duplicated by id, in a ranking that is stable for an
    /// unchanged corpus.
    async fn search(&self, query: &StoreQuery) -> Result<SearchResults, DomainError>;

    /// Most recent entries, newest first, ties broken by ascending id
    async fn recent(
        &self,
        limit: usize,
        kind: Option<MemoryKind>,
    ) -> Result<Vec<MemoryEntry>, DomainError>;

    /// Aggregate counters
    async fn stats(&self) -> Result<StoreStats, DomainError>;

    /// Remove an entry; missing ids are `NotFound`
    async fn delete(&self, id: &str) -> Result<(), DomainError>;

    /// Minimal liveness check
    async fn health(&self) -> Result<StoreHealth, DomainError>;
}
