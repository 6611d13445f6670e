//! Retrieval Facade
//!
//! Validating layer over the memory store. Everything the store receives has
//! been parsed, normalized and clamped here; everything a caller receives is
//! an external view without store-internal fields.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::services::text::{MAX_CONTENT_CHARS, MAX_ENTRY_TAGS, MAX_SUMMARY_CHARS};
use crate::domain::{
    normalize_tags, DomainError, MemoryEntry, MemoryKind, MemorySource, NewMemoryEntry,
    SearchMode, StoreStats,
};
use crate::ports::{MemoryStore, StoreQuery};

pub const DEFAULT_LIMIT: usize = 10;
pub const MIN_LIMIT: usize = 1;
pub const MAX_LIMIT: usize = 50;

/// Clamp a caller-supplied limit into `[MIN_LIMIT, MAX_LIMIT]`
pub fn clamp_limit(limit: Option<i64>) -> usize {
    match limit {
        None => DEFAULT_LIMIT,
        Some(n) => n.clamp(MIN_LIMIT as i64, MAX_LIMIT as i64) as usize,
    }
}

// ============================================
// Requests
// ============================================

/// Unvalidated search request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SearchParams {
    pub query: String,
    /// semantic | keyword | hybrid (default)
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Unvalidated recent-entries request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RecentParams {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub kind: Option<String>,
}

/// Manual save that bypasses classification
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DirectSave {
    pub content: String,
    pub kind: String,
    pub tags: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub source: MemorySource,
}

// ============================================
// Views
// ============================================

/// External representation of an entry
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MemoryView {
    pub id: String,
    pub kind: MemoryKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub source: MemorySource,
    pub timestamp: DateTime<Utc>,
}

impl From<MemoryEntry> for MemoryView {
    fn from(entry: MemoryEntry) -> Self {
        Self {
            id: entry.id,
            kind: entry.kind,
            content: entry.content,
            summary: entry.summary,
            tags: entry.tags,
            source: entry.source,
            timestamp: entry.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SearchResponse {
    pub query: String,
    pub mode: SearchMode,
    pub total: usize,
    pub entries: Vec<MemoryView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RecentResponse {
    pub count: usize,
    pub entries: Vec<MemoryView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatsView {
    pub total_entries: u64,
    pub entries_by_kind: BTreeMap<String, u64>,
    pub entries_by_source: BTreeMap<String, u64>,
    pub last_updated: DateTime<Utc>,
    pub storage_size: String,
}

impl From<StoreStats> for StatsView {
    fn from(stats: StoreStats) -> Self {
        Self {
            total_entries: stats.total_entries,
            entries_by_kind: stats
                .entries_by_kind
                .into_iter()
                .map(|(kind, count)| (kind.to_string(), count))
                .collect(),
            entries_by_source: stats.entries_by_source,
            last_updated: stats.last_updated,
            storage_size: stats.storage_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct HealthReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

// ============================================
// Service
// ============================================

/// Retrieval facade over a memory store
pub struct RetrievalService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: MemoryStore + ?Sized> RetrievalService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn search(&self, params: SearchParams) -> Result<SearchResponse, DomainError> {
        let query = params.query.trim();
        if query.is_empty() {
            return Err(DomainError::Validation("query must not be empty".to_string()));
        }

        let store_query = StoreQuery {
            query: query.to_string(),
            mode: parse_mode(params.mode.as_deref())?,
            kind: parse_kind(params.kind.as_deref())?,
            tags: normalize_tags(&params.tags),
            limit: clamp_limit(params.limit),
        };

        let results = self.store.search(&store_query).await?;

        let returned = results.entries.len();
        let mut seen = HashSet::new();
        let mut entries: Vec<MemoryView> = results
            .entries
            .into_iter()
            .filter(|entry| seen.insert(entry.id.clone()))
            .map(MemoryView::from)
            .collect();
        let duplicates = returned - entries.len();
        entries.truncate(store_query.limit);

        // A store that repeated hits inflated its total by the repeats
        let total = results.total.saturating_sub(duplicates).max(entries.len());

        tracing::debug!(
            query = %store_query.query,
            mode = %store_query.mode,
            hits = entries.len(),
            total,
            "Search completed"
        );

        Ok(SearchResponse {
            query: results.query,
            mode: results.mode,
            total,
            entries,
        })
    }

    pub async fn recent(&self, params: RecentParams) -> Result<RecentResponse, DomainError> {
        let limit = clamp_limit(params.limit);
        let kind = parse_kind(params.kind.as_deref())?;

        let mut entries = self.store.recent(limit, kind).await?;
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        entries.truncate(limit);

        let entries: Vec<MemoryView> = entries.into_iter().map(MemoryView::from).collect();
        Ok(RecentResponse {
            count: entries.len(),
            entries,
        })
    }

    pub async fn stats(&self) -> Result<StatsView, DomainError> {
        Ok(self.store.stats().await?.into())
    }

    /// Liveness of the store. Never fails; errors read as `ok: false`.
    pub async fn health(&self) -> HealthReport {
        match self.store.health().await {
            Ok(health) => HealthReport {
                ok: health.is_ok(),
                version: health.version,
            },
            Err(e) => {
                tracing::warn!("Store health check failed: {}", e);
                HealthReport {
                    ok: false,
                    version: None,
                }
            }
        }
    }

    /// Save without classification. Validates shape, then writes.
    pub async fn save(&self, request: DirectSave) -> Result<MemoryEntry, DomainError> {
        let kind = request
            .kind
            .parse::<MemoryKind>()
            .map_err(DomainError::Validation)?;

        let content_chars = request.content.trim().chars().count();
        if content_chars == 0 || request.content.chars().count() > MAX_CONTENT_CHARS {
            return Err(DomainError::Validation(format!(
                "content must be 1-{} characters",
                MAX_CONTENT_CHARS
            )));
        }

        let tags = normalize_tags(&request.tags);
        if tags.is_empty() || tags.len() > MAX_ENTRY_TAGS {
            return Err(DomainError::Validation(format!(
                "between 1 and {} tags are required",
                MAX_ENTRY_TAGS
            )));
        }

        let summary = request.summary.filter(|s| !s.trim().is_empty());
        if summary
            .as_ref()
            .is_some_and(|s| s.chars().count() > MAX_SUMMARY_CHARS)
        {
            return Err(DomainError::Validation(format!(
                "summary must be at most {} characters",
                MAX_SUMMARY_CHARS
            )));
        }

        let mut entry = NewMemoryEntry::new(kind, request.content, tags, request.source);
        if let Some(summary) = summary {
            entry = entry.with_summary(summary);
        }

        let saved = self.store.save(entry).await?;
        tracing::info!(id = %saved.id, kind = %saved.kind, "Memory saved directly");
        Ok(saved)
    }

    pub async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(DomainError::Validation("id must not be empty".to_string()));
        }
        self.store.delete(id).await?;
        tracing::info!(%id, "Memory deleted");
        Ok(())
    }
}

fn parse_mode(mode: Option<&str>) -> Result<SearchMode, DomainError> {
    match mode {
        None => Ok(SearchMode::default()),
        Some(m) => m.parse().map_err(DomainError::Validation),
    }
}

fn parse_kind(kind: Option<&str>) -> Result<Option<MemoryKind>, DomainError> {
    kind.map(|k| k.parse().map_err(DomainError::Validation))
        .transpose()
}
