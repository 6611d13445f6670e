//! Stub adapters shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use engram::{
    ClassificationResult, DomainError, ImportanceClassifier, MemoryEntry, MemoryKind,
    MemorySource, MemoryStore, NewMemoryEntry, SearchMode, SearchResults, SourceTool, StoreHealth,
    StoreQuery, StoreStats,
};

// ============================================
// Classifier
// ============================================

#[derive(Clone)]
enum Verdict {
    Result(ClassificationResult),
    Fail(String),
}

/// Classifier returning a scripted verdict and counting calls
pub struct StubClassifier {
    verdict: Mutex<Verdict>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubClassifier {
    pub fn returning(result: ClassificationResult) -> Arc<Self> {
        Arc::new(Self {
            verdict: Mutex::new(Verdict::Result(result)),
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn important(kind: MemoryKind, confidence: f32) -> Arc<Self> {
        Self::returning(verdict(kind, confidence))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            verdict: Mutex::new(Verdict::Fail(message.to_string())),
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn slow(result: ClassificationResult, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            verdict: Mutex::new(Verdict::Result(result)),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, result: ClassificationResult) {
        *self.verdict.lock() = Verdict::Result(result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImportanceClassifier for StubClassifier {
    async fn classify(
        &self,
        _request: &str,
        _response: &str,
    ) -> Result<ClassificationResult, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let verdict = self.verdict.lock().clone();
        match verdict {
            Verdict::Result(result) => Ok(result),
            Verdict::Fail(message) => Err(DomainError::Classifier(message)),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// An important verdict with a recognizable summary
pub fn verdict(kind: MemoryKind, confidence: f32) -> ClassificationResult {
    ClassificationResult {
        is_important: true,
        kind,
        summary: "Use split borrows to satisfy the borrow checker".to_string(),
        tags: vec!["rust".to_string(), "borrowck".to_string()],
        confidence,
        context: Some("Recurring compiler error".to_string()),
    }
}

// ============================================
// Store
// ============================================

/// In-memory store with deterministic ids.
///
/// Keyword matching is a case-insensitive substring test on content;
/// "semantic" matching is an overlap between query words and tags.
#[derive(Default)]
pub struct StubStore {
    entries: Mutex<Vec<MemoryEntry>>,
    next_id: AtomicUsize,
    fail_saves: AtomicBool,
    unreachable: AtomicBool,
    repeat_hits: AtomicBool,
    search_calls: AtomicUsize,
    last_query: Mutex<Option<StoreQuery>>,
    last_recent: Mutex<Option<(usize, Option<MemoryKind>)>>,
}

impl StubStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every save fail until reset
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Make every call fail as if the backend were down
    pub fn set_unreachable(&self, down: bool) {
        self.unreachable.store(down, Ordering::SeqCst);
    }

    /// Return hybrid hits without de-duplication
    pub fn repeat_hits(&self, repeat: bool) {
        self.repeat_hits.store(repeat, Ordering::SeqCst);
    }

    pub fn seed(&self, kind: MemoryKind, content: &str, tags: &[&str], timestamp: DateTime<Utc>) -> String {
        let id = self.allocate_id();
        let entry = NewMemoryEntry::new(
            kind,
            content,
            tags.iter().map(|t| t.to_string()).collect(),
            MemorySource::new(SourceTool::Manual),
        )
        .with_metadata(serde_json::json!({ "internal": true }))
        .into_entry(id.clone(), timestamp);
        self.entries.lock().push(entry);
        id
    }

    pub fn saved(&self) -> Vec<MemoryEntry> {
        self.entries.lock().clone()
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<StoreQuery> {
        self.last_query.lock().clone()
    }

    pub fn last_recent(&self) -> Option<(usize, Option<MemoryKind>)> {
        *self.last_recent.lock()
    }

    fn allocate_id(&self) -> String {
        format!("mem-{:04}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn check_reachable(&self) -> Result<(), DomainError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(DomainError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    fn keyword_hits(&self, query: &StoreQuery) -> Vec<MemoryEntry> {
        let needle = query.query.to_lowercase();
        self.filtered(query)
            .into_iter()
            .filter(|e| e.content.to_lowercase().contains(&needle))
            .collect()
    }

    fn semantic_hits(&self, query: &StoreQuery) -> Vec<MemoryEntry> {
        let words: Vec<String> = query
            .query
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        self.filtered(query)
            .into_iter()
            .filter(|e| e.tags.iter().any(|t| words.contains(t)))
            .collect()
    }

    fn filtered(&self, query: &StoreQuery) -> Vec<MemoryEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| query.kind.map_or(true, |k| e.kind == k))
            .filter(|e| query.tags.iter().all(|t| e.tags.contains(t)))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MemoryStore for StubStore {
    async fn save(&self, entry: NewMemoryEntry) -> Result<MemoryEntry, DomainError> {
        self.check_reachable()?;
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(DomainError::Store("write conflict".to_string()));
        }
        let saved = entry.into_entry(self.allocate_id(), Utc::now());
        self.entries.lock().push(saved.clone());
        Ok(saved)
    }

    async fn search(&self, query: &StoreQuery) -> Result<SearchResults, DomainError> {
        self.check_reachable()?;
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock() = Some(query.clone());

        let mut entries = match query.mode {
            SearchMode::Keyword => self.keyword_hits(query),
            SearchMode::Semantic => self.semantic_hits(query),
            SearchMode::Hybrid => {
                let mut union = self.semantic_hits(query);
                union.extend(self.keyword_hits(query));
                if !self.repeat_hits.load(Ordering::SeqCst) {
                    let mut seen = std::collections::HashSet::new();
                    union.retain(|e| seen.insert(e.id.clone()));
                }
                union
            }
        };
        let total = entries.len();
        entries.truncate(query.limit);

        Ok(SearchResults {
            entries,
            total,
            query: query.query.clone(),
            mode: query.mode,
        })
    }

    async fn recent(
        &self,
        limit: usize,
        kind: Option<MemoryKind>,
    ) -> Result<Vec<MemoryEntry>, DomainError> {
        self.check_reachable()?;
        *self.last_recent.lock() = Some((limit, kind));
        // Insertion order on purpose: the facade owns the final ordering
        Ok(self
            .entries
            .lock()
            .iter()
            .filter(|e| kind.map_or(true, |k| e.kind == k))
            .cloned()
            .collect())
    }

    async fn stats(&self) -> Result<StoreStats, DomainError> {
        self.check_reachable()?;
        let entries = self.entries.lock();
        let mut stats = StoreStats {
            total_entries: entries.len() as u64,
            entries_by_kind: Default::default(),
            entries_by_source: Default::default(),
            last_updated: entries
                .iter()
                .map(|e| e.timestamp)
                .max()
                .unwrap_or_else(Utc::now),
            storage_size: format!("{} B", entries.iter().map(|e| e.content.len()).sum::<usize>()),
        };
        for entry in entries.iter() {
            *stats.entries_by_kind.entry(entry.kind).or_insert(0) += 1;
            *stats
                .entries_by_source
                .entry(entry.source.tool.to_string())
                .or_insert(0) += 1;
        }
        Ok(stats)
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        self.check_reachable()?;
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Err(DomainError::not_found("MemoryEntry", id));
        }
        Ok(())
    }

    async fn health(&self) -> Result<StoreHealth, DomainError> {
        self.check_reachable()?;
        Ok(StoreHealth {
            status: "ok".to_string(),
            version: Some("stub-1".to_string()),
        })
    }
}

pub fn session(id: &str) -> MemorySource {
    MemorySource::new(SourceTool::ClaudeCode).with_session(id)
}
