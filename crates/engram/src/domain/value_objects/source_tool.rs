//! SourceTool - The client that produced an interaction

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Originating tool of a memory entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SourceTool {
    ClaudeCode,
    Codex,
    Cursor,
    #[default]
    Api,
    Manual,
}

impl std::fmt::Display for SourceTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceTool::ClaudeCode => write!(f, "claude-code"),
            SourceTool::Codex => write!(f, "codex"),
            SourceTool::Cursor => write!(f, "cursor"),
            SourceTool::Api => write!(f, "api"),
            SourceTool::Manual => write!(f, "manual"),
        }
    }
}

impl std::str::FromStr for SourceTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude-code" => Ok(SourceTool::ClaudeCode),
            "codex" => Ok(SourceTool::Codex),
            "cursor" => Ok(SourceTool::Cursor),
            "api" => Ok(SourceTool::Api),
            "manual" => Ok(SourceTool::Manual),
            _ => Err(format!("Unknown source tool: {}", s)),
        }
    }
}
