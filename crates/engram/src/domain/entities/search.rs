//! Store query results

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MemoryEntry;
use crate::domain::value_objects::{MemoryKind, SearchMode};

/// Search hits as ranked by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub entries: Vec<MemoryEntry>,
    /// Number of matches the store reports
    pub total: usize,
    pub query: String,
    pub mode: SearchMode,
}

/// Aggregate counters reported by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_entries: u64,
    pub entries_by_kind: BTreeMap<MemoryKind, u64>,
    pub entries_by_source: BTreeMap<String, u64>,
    pub last_updated: DateTime<Utc>,
    /// Human readable, e.g. "1.5 MB"
    pub storage_size: String,
}

/// Raw liveness answer of the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHealth {
    pub status: String,
    pub version: Option<String>,
}

impl StoreHealth {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
