//! Brain Backend Store
//!
//! `MemoryStore` over the brain REST API using reqwest.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use engram::{
    DomainError, MemoryEntry, MemoryKind, MemorySource, MemoryStore, NewMemoryEntry, SearchMode,
    SearchResults, SourceTool, StoreHealth, StoreQuery, StoreStats,
};

pub struct HttpMemoryStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpMemoryStore {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Store(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, DomainError> {
        let response = self.dispatch(request, what).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| DomainError::Store(format!("Invalid {what} response: {e}")))
    }

    async fn dispatch(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<reqwest::Response, DomainError> {
        let request = match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DomainError::timeout(format!("brain {what}"), self.timeout)
            } else if e.is_connect() {
                DomainError::Unavailable(e.to_string())
            } else {
                DomainError::Store(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_http_error(status, &body, what))
    }
}

#[async_trait]
impl MemoryStore for HttpMemoryStore {
    async fn save(&self, entry: NewMemoryEntry) -> Result<MemoryEntry, DomainError> {
        let request = self
            .client
            .post(self.url("/api/brain/entries"))
            .json(&WireNewEntry::from(entry));
        let saved: WireEntry = self.send(request, "save").await?;
        Ok(saved.into())
    }

    async fn search(&self, query: &StoreQuery) -> Result<SearchResults, DomainError> {
        let mut params = vec![
            ("q", query.query.clone()),
            ("mode", query.mode.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(kind) = query.kind {
            params.push(("type", kind.to_string()));
        }
        if !query.tags.is_empty() {
            params.push(("tags", query.tags.join(",")));
        }

        let request = self.client.get(self.url("/api/brain/search")).query(&params);
        let result: WireSearchResult = self.send(request, "search").await?;

        Ok(SearchResults {
            entries: result.entries.into_iter().map(MemoryEntry::from).collect(),
            total: result.total,
            query: result.query.unwrap_or_else(|| query.query.clone()),
            mode: result
                .mode
                .and_then(|m| m.parse().ok())
                .unwrap_or(query.mode),
        })
    }

    async fn recent(
        &self,
        limit: usize,
        kind: Option<MemoryKind>,
    ) -> Result<Vec<MemoryEntry>, DomainError> {
        let mut params = vec![("limit", limit.to_string())];
        if let Some(kind) = kind {
            params.push(("type", kind.to_string()));
        }

        let request = self.client.get(self.url("/api/brain/recent")).query(&params);
        let entries: Vec<WireEntry> = self.send(request, "recent").await?;
        Ok(entries.into_iter().map(MemoryEntry::from).collect())
    }

    async fn stats(&self) -> Result<StoreStats, DomainError> {
        let request = self.client.get(self.url("/api/brain/stats"));
        let stats: WireStats = self.send(request, "stats").await?;
        Ok(stats.into())
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let request = self
            .client
            .delete(self.url(&format!("/api/brain/entries/{id}")));
        match self.dispatch(request, "delete").await {
            Err(DomainError::NotFound { .. }) => Err(DomainError::not_found("MemoryEntry", id)),
            other => other.map(|_| ()),
        }
    }

    async fn health(&self) -> Result<StoreHealth, DomainError> {
        let request = self.client.get(self.url("/api/brain/health"));
        let health: WireHealth = self.send(request, "health").await?;
        Ok(StoreHealth {
            status: health.status,
            version: health.version,
        })
    }
}

fn map_http_error(status: StatusCode, body: &str, what: &str) -> DomainError {
    let message = serde_json::from_str::<WireError>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    match status {
        StatusCode::NOT_FOUND => DomainError::not_found(what, &message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            DomainError::Validation(message)
        }
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
            DomainError::Unavailable(message)
        }
        _ => DomainError::Store(message),
    }
}

// ============================================
// Wire types
// ============================================

#[derive(Deserialize)]
struct WireError {
    message: Option<String>,
}

#[derive(Serialize)]
struct WireNewEntry {
    #[serde(rename = "type")]
    kind: MemoryKind,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    tags: Vec<String>,
    source: MemorySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<serde_json::Value>,
}

impl From<NewMemoryEntry> for WireNewEntry {
    fn from(entry: NewMemoryEntry) -> Self {
        Self {
            kind: entry.kind,
            content: entry.content,
            summary: entry.summary,
            tags: entry.tags,
            source: entry.source,
            metadata: entry.metadata,
        }
    }
}

#[derive(Deserialize)]
struct WireEntry {
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
    content: String,
    summary: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    source: WireSource,
    timestamp: DateTime<Utc>,
    metadata: Option<serde_json::Value>,
}

/// Source as the backend reports it; tool names outside the known set are
/// tolerated.
#[derive(Deserialize, Default)]
struct WireSource {
    #[serde(default)]
    tool: String,
    session_id: Option<String>,
    project: Option<String>,
    file: Option<String>,
    user_id: Option<String>,
}

impl From<WireEntry> for MemoryEntry {
    fn from(wire: WireEntry) -> Self {
        MemoryEntry {
            id: wire.id,
            kind: MemoryKind::coerce(&wire.kind),
            content: wire.content,
            summary: wire.summary,
            tags: wire.tags,
            source: MemorySource {
                tool: wire.source.tool.parse().unwrap_or(SourceTool::Api),
                session_id: wire.source.session_id,
                project: wire.source.project,
                file: wire.source.file,
                user_id: wire.source.user_id,
            },
            timestamp: wire.timestamp,
            metadata: wire.metadata,
        }
    }
}

#[derive(Deserialize)]
struct WireSearchResult {
    #[serde(default)]
    entries: Vec<WireEntry>,
    #[serde(default)]
    total: usize,
    query: Option<String>,
    mode: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStats {
    total_entries: u64,
    #[serde(default)]
    entries_by_type: BTreeMap<String, u64>,
    #[serde(default)]
    entries_by_source: BTreeMap<String, u64>,
    last_updated: DateTime<Utc>,
    #[serde(default)]
    storage_size: String,
}

impl From<WireStats> for StoreStats {
    fn from(wire: WireStats) -> Self {
        let mut entries_by_kind = BTreeMap::new();
        for (kind, count) in wire.entries_by_type {
            *entries_by_kind.entry(MemoryKind::coerce(&kind)).or_insert(0) += count;
        }
        StoreStats {
            total_entries: wire.total_entries,
            entries_by_kind,
            entries_by_source: wire.entries_by_source,
            last_updated: wire.last_updated,
            storage_size: wire.storage_size,
        }
    }
}

#[derive(Deserialize)]
struct WireHealth {
    status: String,
    version: Option<String>,
}
