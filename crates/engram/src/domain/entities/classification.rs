//! ClassificationResult - Transient verdict from the importance classifier

use serde::{Deserialize, Serialize};

use crate::domain::services::text::{
    truncate_chars, MAX_CLASSIFIER_TAGS, MAX_CONTEXT_CHARS, MAX_SUMMARY_CHARS,
};
use crate::domain::services::normalize_tags;
use crate::domain::value_objects::MemoryKind;

/// Sanitized classifier output. Consumed by the admission gate, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub is_important: bool,
    pub kind: MemoryKind,
    pub summary: String,
    pub tags: Vec<String>,
    /// Always within [0, 1]
    pub confidence: f32,
    pub context: Option<String>,
}

impl ClassificationResult {
    /// The verdict used whenever classification fails.
    pub fn rejected() -> Self {
        Self {
            is_important: false,
            kind: MemoryKind::Context,
            summary: String::new(),
            tags: Vec::new(),
            confidence: 0.0,
            context: None,
        }
    }

    /// Build a result from loosely typed classifier output, enforcing every
    /// bound: unknown kinds become `context`, confidence is clamped, text and
    /// tags are cut to their limits.
    pub fn sanitized(raw: RawClassification) -> Self {
        let kind = raw
            .kind
            .as_deref()
            .map(MemoryKind::coerce)
            .unwrap_or_default();

        let confidence = raw.confidence.unwrap_or(0.0);
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0) as f32
        } else {
            0.0
        };

        let summary = raw
            .summary
            .map(|s| truncate_chars(&s, MAX_SUMMARY_CHARS).to_string())
            .unwrap_or_default();

        let tags = raw
            .tags
            .map(|tags| {
                let mut tags = normalize_tags(tags);
                tags.truncate(MAX_CLASSIFIER_TAGS);
                tags
            })
            .unwrap_or_default();

        let context = raw
            .context
            .filter(|c| !c.trim().is_empty())
            .map(|c| truncate_chars(&c, MAX_CONTEXT_CHARS).to_string());

        Self {
            is_important: raw.is_important.unwrap_or(false),
            kind,
            summary,
            tags,
            confidence,
            context,
        }
    }

    /// Re-apply the bounds to a result built elsewhere. Non-finite confidence
    /// becomes 0.
    pub fn bounded(self) -> Self {
        let confidence = if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut tags = normalize_tags(self.tags);
        tags.truncate(MAX_CLASSIFIER_TAGS);

        Self {
            is_important: self.is_important,
            kind: self.kind,
            summary: truncate_chars(&self.summary, MAX_SUMMARY_CHARS).to_string(),
            tags,
            confidence,
            context: self
                .context
                .filter(|c| !c.trim().is_empty())
                .map(|c| truncate_chars(&c, MAX_CONTEXT_CHARS).to_string()),
        }
    }
}

/// Classifier output before validation. Every field is optional so that a
/// partially well-formed reply still yields a result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawClassification {
    #[serde(default, alias = "is_important")]
    pub is_important: Option<bool>,
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub context: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_shape() {
        let result = ClassificationResult::rejected();
        assert!(!result.is_important);
        assert_eq!(result.kind, MemoryKind::Context);
        assert_eq!(result.confidence, 0.0);
        assert!(result.summary.is_empty());
        assert!(result.tags.is_empty());
        assert!(result.context.is_none());
    }

    #[test]
    fn test_sanitize_clamps_and_coerces() {
        let raw: RawClassification = serde_json::from_value(serde_json::json!({
            "isImportant": true,
            "type": "insight",
            "summary": "x".repeat(300),
            "tags": [" Rust", "rust", "Tokio", "a", "b", "c", "d"],
            "confidence": 1.7,
            "context": "   "
        }))
        .unwrap();

        let result = ClassificationResult::sanitized(raw);
        assert!(result.is_important);
        assert_eq!(result.kind, MemoryKind::Context);
        assert_eq!(result.summary.chars().count(), MAX_SUMMARY_CHARS);
        assert_eq!(result.tags, vec!["rust", "tokio", "a", "b", "c"]);
        assert_eq!(result.confidence, 1.0);
        assert!(result.context.is_none());
    }

    #[test]
    fn test_sanitize_missing_fields_default_to_reject() {
        let result = ClassificationResult::sanitized(RawClassification::default());
        assert_eq!(result, ClassificationResult::rejected());
    }

    #[test]
    fn test_bounded_fixes_out_of_range_fields() {
        let result = ClassificationResult {
            is_important: true,
            kind: MemoryKind::Pattern,
            summary: "s".repeat(250),
            tags: vec!["A B ".to_string(); 9],
            confidence: f32::NAN,
            context: Some("  ".to_string()),
        }
        .bounded();

        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.summary.chars().count(), MAX_SUMMARY_CHARS);
        assert!(result.tags.len() <= MAX_CLASSIFIER_TAGS);
        assert!(result.context.is_none());

        let high = ClassificationResult {
            confidence: 3.0,
            ..ClassificationResult::rejected()
        };
        assert_eq!(high.bounded().confidence, 1.0);
    }

    #[test]
    fn test_negative_confidence_clamps_to_zero() {
        let raw = RawClassification {
            is_important: Some(true),
            kind: Some("fix".to_string()),
            confidence: Some(-0.3),
            ..Default::default()
        };
        let result = ClassificationResult::sanitized(raw);
        assert_eq!(result.kind, MemoryKind::Fix);
        assert_eq!(result.confidence, 0.0);
    }
}
