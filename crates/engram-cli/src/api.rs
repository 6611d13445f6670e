//! Engram API Client

use anyhow::{bail, Context, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// API Client for Engram
pub struct EngramClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

// ============================================
// API Response Types
// ============================================

#[derive(Debug, Deserialize)]
pub struct SourceView {
    pub tool: String,
    pub project: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MemoryView {
    pub id: String,
    pub kind: String,
    pub content: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source: SourceView,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub mode: String,
    pub total: usize,
    pub entries: Vec<MemoryView>,
}

#[derive(Debug, Deserialize)]
pub struct RecentResponse {
    pub entries: Vec<MemoryView>,
}

#[derive(Debug)]
pub struct StatsResponse {
    pub total_entries: u64,
    pub entries_by_kind: Vec<(String, u64)>,
    pub entries_by_source: Vec<(String, u64)>,
    pub last_updated: String,
    pub storage_size: String,
}

#[derive(Debug, Deserialize)]
pub struct StoreHealthResponse {
    pub ok: bool,
    pub version: Option<String>,
    pub server_version: String,
}

#[derive(Debug, Deserialize)]
pub struct AdmissionOutcome {
    pub admitted: bool,
    pub entry: Option<MemoryView>,
}

#[derive(Debug, Deserialize)]
pub struct AdmissionConfig {
    pub enabled: bool,
    pub min_confidence: f32,
    pub exclude_kinds: Vec<String>,
    pub max_entries_per_session: usize,
    pub deduplication_window_minutes: u64,
}

#[derive(Debug, Deserialize)]
pub struct AdmissionStatus {
    pub config: AdmissionConfig,
    pub session_counts: std::collections::BTreeMap<String, usize>,
}

// ============================================
// API Request Types
// ============================================

#[derive(Debug, Default, Serialize)]
pub struct Source {
    pub tool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveRequest {
    pub content: String,
    pub kind: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub source: Source,
}

#[derive(Debug, Serialize)]
pub struct InteractionRequest {
    pub request: String,
    pub response: String,
    pub source: Source,
}

/// Partial admission config; unset fields are left alone by the server
#[derive(Debug, Default, Serialize)]
pub struct ConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_kinds: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_entries_per_session: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deduplication_window_minutes: Option<u64>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none()
            && self.min_confidence.is_none()
            && self.exclude_kinds.is_none()
            && self.max_entries_per_session.is_none()
            && self.deduplication_window_minutes.is_none()
    }
}

impl EngramClient {
    /// Create a new API client
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let request = self.authorized(request);
        let resp = request
            .send()
            .await
            .context("Failed to connect to Engram API")?;

        tracing::debug!(status = %resp.status(), url = %resp.url(), "API response");

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("API error ({}): {}", status, body);
        }
        Ok(resp)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = self.execute(request).await?;
        resp.json().await.context("Failed to parse response")
    }

    /// Test connection with health check
    pub async fn health(&self) -> Result<bool> {
        let resp = self.client.get(self.url("/health")).send().await?;
        Ok(resp.status().is_success())
    }

    pub async fn store_health(&self) -> Result<StoreHealthResponse> {
        self.fetch(self.client.get(self.url("/engram/store/health")))
            .await
    }

    pub async fn search(
        &self,
        query: &str,
        mode: Option<&str>,
        kind: Option<&str>,
        tags: &[String],
        limit: usize,
    ) -> Result<SearchResponse> {
        let mut params = vec![("q", query.to_string()), ("limit", limit.to_string())];
        if let Some(mode) = mode {
            params.push(("mode", mode.to_string()));
        }
        if let Some(kind) = kind {
            params.push(("kind", kind.to_string()));
        }
        if !tags.is_empty() {
            params.push(("tags", tags.join(",")));
        }

        self.fetch(self.client.get(self.url("/engram/search")).query(&params))
            .await
    }

    pub async fn recent(&self, limit: usize, kind: Option<&str>) -> Result<RecentResponse> {
        let mut params = vec![("limit", limit.to_string())];
        if let Some(kind) = kind {
            params.push(("kind", kind.to_string()));
        }

        self.fetch(self.client.get(self.url("/engram/recent")).query(&params))
            .await
    }

    pub async fn stats(&self) -> Result<StatsResponse> {
        let raw: Value = self.fetch(self.client.get(self.url("/engram/stats"))).await?;
        parse_stats(raw)
    }

    pub async fn save(&self, request: &SaveRequest) -> Result<MemoryView> {
        self.fetch(self.client.post(self.url("/engram/entries")).json(request))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let path = format!("/engram/entries/{}", urlencoding::encode(id));
        self.execute(self.client.delete(self.url(&path))).await?;
        Ok(())
    }

    pub async fn ingest(&self, request: &InteractionRequest) -> Result<AdmissionOutcome> {
        self.fetch(self.client.post(self.url("/engram/interactions")).json(request))
            .await
    }

    pub async fn status(&self) -> Result<AdmissionStatus> {
        self.fetch(self.client.get(self.url("/engram/admission")))
            .await
    }

    pub async fn tune(&self, update: &ConfigUpdate) -> Result<AdmissionConfig> {
        self.fetch(self.client.patch(self.url("/engram/admission")).json(update))
            .await
    }
}

/// Stats maps arrive as JSON objects; keep them sorted by count for display
fn parse_stats(raw: Value) -> Result<StatsResponse> {
    fn counts(value: Option<&Value>) -> Vec<(String, u64)> {
        let mut pairs: Vec<(String, u64)> = value
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_u64().map(|n| (k.clone(), n)))
                    .collect()
            })
            .unwrap_or_default();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pairs
    }

    let text = |key: &str| {
        raw.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Ok(StatsResponse {
        total_entries: raw
            .get("total_entries")
            .and_then(Value::as_u64)
            .context("Stats response lacks total_entries")?,
        entries_by_kind: counts(raw.get("entries_by_kind")),
        entries_by_source: counts(raw.get("entries_by_source")),
        last_updated: text("last_updated"),
        storage_size: text("storage_size"),
    })
}
