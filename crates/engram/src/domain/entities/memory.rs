//! MemoryEntry - The durable unit of knowledge
//!
//! Pure domain entity without infrastructure dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::value_objects::{MemoryKind, SourceTool};

/// Provenance of a memory entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MemorySource {
    /// Tool that produced the interaction
    #[serde(default)]
    pub tool: SourceTool,
    /// Session used for quota accounting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl MemorySource {
    pub fn new(tool: SourceTool) -> Self {
        Self {
            tool,
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }
}

/// A stored piece of knowledge. Only a store creates these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MemoryEntry {
    /// Store-assigned identifier
    pub id: String,
    pub kind: MemoryKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source: MemorySource,
    /// Store-assigned creation time
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
}

/// An entry as submitted to the store, before it has an id or timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMemoryEntry {
    pub kind: MemoryKind,
    pub content: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub source: MemorySource,
    pub metadata: Option<serde_json::Value>,
}

impl NewMemoryEntry {
    pub fn new(kind: MemoryKind, content: impl Into<String>, tags: Vec<String>, source: MemorySource) -> Self {
        Self {
            kind,
            content: content.into(),
            summary: None,
            tags,
            source,
            metadata: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Materialize with store-assigned identity. Intended for store adapters.
    pub fn into_entry(self, id: impl Into<String>, timestamp: DateTime<Utc>) -> MemoryEntry {
        MemoryEntry {
            id: id.into(),
            kind: self.kind,
            content: self.content,
            summary: self.summary,
            tags: self.tags,
            source: self.source,
            timestamp,
            metadata: self.metadata,
        }
    }
}
