//! AdmissionConfig - Tunables of the admission gate

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::errors::DomainError;
use crate::domain::value_objects::MemoryKind;

pub const ENV_ENABLED: &str = "AUTO_MEMORY_ENABLED";
pub const ENV_MIN_CONFIDENCE: &str = "AUTO_MEMORY_MIN_CONFIDENCE";
pub const ENV_MAX_ENTRIES_PER_SESSION: &str = "AUTO_MEMORY_MAX_ENTRIES_PER_SESSION";
pub const ENV_DEDUP_WINDOW_MINUTES: &str = "AUTO_MEMORY_DEDUP_WINDOW_MINUTES";
pub const ENV_EXCLUDE_KINDS: &str = "AUTO_MEMORY_EXCLUDE_KINDS";

/// Longest accepted deduplication window (one year)
pub const MAX_DEDUP_WINDOW_MINUTES: u64 = 525_600;

/// Live configuration of the admission gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdmissionConfig {
    /// Master switch. When off nothing is classified or saved.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Inclusive confidence threshold in [0, 1]
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    /// Kinds that are never admitted
    #[serde(default)]
    pub exclude_kinds: Vec<MemoryKind>,
    /// Admissions allowed per session for the process lifetime
    #[serde(default = "default_max_entries_per_session")]
    pub max_entries_per_session: usize,
    /// Period after which all remembered fingerprints are dropped
    #[serde(default = "default_deduplication_window_minutes")]
    pub deduplication_window_minutes: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_min_confidence() -> f32 {
    0.7
}

fn default_max_entries_per_session() -> usize {
    50
}

fn default_deduplication_window_minutes() -> u64 {
    30
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            min_confidence: default_min_confidence(),
            exclude_kinds: Vec::new(),
            max_entries_per_session: default_max_entries_per_session(),
            deduplication_window_minutes: default_deduplication_window_minutes(),
        }
    }
}

impl AdmissionConfig {
    /// Read the configuration from an environment-style lookup
    /// (process env, secret store, ...). Missing or unparsable values keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_ENABLED) {
            config.enabled = value.trim() != "false";
        }

        if let Some(value) = lookup(ENV_MIN_CONFIDENCE) {
            match value.trim().parse::<f32>() {
                Ok(v) if (0.0..=1.0).contains(&v) => config.min_confidence = v,
                _ => tracing::warn!("Ignoring {}={:?}, expected 0.0-1.0", ENV_MIN_CONFIDENCE, value),
            }
        }

        if let Some(value) = lookup(ENV_MAX_ENTRIES_PER_SESSION) {
            match value.trim().parse::<usize>() {
                Ok(v) => config.max_entries_per_session = v,
                Err(_) => tracing::warn!(
                    "Ignoring {}={:?}, expected an integer",
                    ENV_MAX_ENTRIES_PER_SESSION,
                    value
                ),
            }
        }

        if let Some(value) = lookup(ENV_DEDUP_WINDOW_MINUTES) {
            match value.trim().parse::<u64>() {
                Ok(v) if (1..=MAX_DEDUP_WINDOW_MINUTES).contains(&v) => {
                    config.deduplication_window_minutes = v
                }
                _ => tracing::warn!(
                    "Ignoring {}={:?}, expected 1-{}",
                    ENV_DEDUP_WINDOW_MINUTES,
                    value,
                    MAX_DEDUP_WINDOW_MINUTES
                ),
            }
        }

        if let Some(value) = lookup(ENV_EXCLUDE_KINDS) {
            config.exclude_kinds = value
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .filter_map(|s| match s.parse::<MemoryKind>() {
                    Ok(kind) => Some(kind),
                    Err(e) => {
                        tracing::warn!("Ignoring entry in {}: {}", ENV_EXCLUDE_KINDS, e);
                        None
                    }
                })
                .collect();
        }

        config
    }

    /// Merge a partial update. The update is validated as a whole first so a
    /// bad field leaves the config untouched.
    pub fn apply(&mut self, update: AdmissionConfigUpdate) -> Result<(), DomainError> {
        update.validate()?;

        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(min_confidence) = update.min_confidence {
            self.min_confidence = min_confidence;
        }
        if let Some(exclude_kinds) = update.exclude_kinds {
            self.exclude_kinds = exclude_kinds;
        }
        if let Some(max) = update.max_entries_per_session {
            self.max_entries_per_session = max;
        }
        if let Some(window) = update.deduplication_window_minutes {
            self.deduplication_window_minutes = window;
        }
        Ok(())
    }
}

/// Partial configuration; absent fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdmissionConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_kinds: Option<Vec<MemoryKind>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries_per_session: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deduplication_window_minutes: Option<u64>,
}

impl AdmissionConfigUpdate {
    fn validate(&self) -> Result<(), DomainError> {
        if let Some(v) = self.min_confidence {
            if !(0.0..=1.0).contains(&v) {
                return Err(DomainError::Validation(format!(
                    "min_confidence must be within 0.0-1.0, got {}",
                    v
                )));
            }
        }
        if let Some(v) = self.deduplication_window_minutes {
            if !(1..=MAX_DEDUP_WINDOW_MINUTES).contains(&v) {
                return Err(DomainError::Validation(format!(
                    "deduplication_window_minutes must be within 1-{}, got {}",
                    MAX_DEDUP_WINDOW_MINUTES, v
                )));
            }
        }
        Ok(())
    }
}
