//! MemoryKind - Classification of memory content

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Closed set of memory kinds understood by the store
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// Architecture or design decision
    Decision,
    /// Bug fix and its resolution
    Fix,
    /// Something learned, a best practice
    Learning,
    /// Established code pattern
    Pattern,
    /// User preference
    Preference,
    /// Configuration detail
    Config,
    /// Error and its cause
    Error,
    /// Project context
    #[default]
    Context,
    /// Notable conversation excerpt
    Conversation,
}

impl MemoryKind {
    pub const ALL: [MemoryKind; 9] = [
        MemoryKind::Decision,
        MemoryKind::Fix,
        MemoryKind::Learning,
        MemoryKind::Pattern,
        MemoryKind::Preference,
        MemoryKind::Config,
        MemoryKind::Error,
        MemoryKind::Context,
        MemoryKind::Conversation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Decision => "decision",
            MemoryKind::Fix => "fix",
            MemoryKind::Learning => "learning",
            MemoryKind::Pattern => "pattern",
            MemoryKind::Preference => "preference",
            MemoryKind::Config => "config",
            MemoryKind::Error => "error",
            MemoryKind::Context => "context",
            MemoryKind::Conversation => "conversation",
        }
    }

    /// Lenient parse for untrusted producers: unknown values become `Context`.
    pub fn coerce(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        MemoryKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or_else(|| format!("Unknown memory kind: {}", s))
    }
}
