//! Admission Gate
//!
//! Decides whether an interaction becomes a memory entry. Checks run in a
//! fixed order and the first failing one rejects:
//!
//! 1. gate disabled (no classifier call)
//! 2. session quota
//! 3. duplicate fingerprint
//! 4. classifier verdict and confidence threshold
//! 5. excluded kind
//!
//! Only an interaction passing all of them is saved and counted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use utoipa::ToSchema;

use super::ledger::{AdmissionLedger, LedgerRefusal, Reservation, SharedLedger};
use crate::domain::services::text::{
    truncate_chars, MAX_ORIGINAL_REQUEST_CHARS, MAX_REQUEST_CHARS, MAX_RESPONSE_CHARS,
};
use crate::domain::{
    AdmissionConfig, AdmissionConfigUpdate, ClassificationResult, DomainError, Fingerprint,
    MemoryEntry, MemorySource, NewMemoryEntry,
};
use crate::ports::{ImportanceClassifier, MemoryStore};

/// Quota bucket for interactions without a session id
pub const DEFAULT_SESSION_KEY: &str = "default";

pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of evaluating one interaction
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AdmissionOutcome {
    pub admitted: bool,
    /// The persisted entry, present only when admitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<MemoryEntry>,
}

impl AdmissionOutcome {
    fn admitted(entry: MemoryEntry) -> Self {
        Self {
            admitted: true,
            entry: Some(entry),
        }
    }

    fn rejected() -> Self {
        Self {
            admitted: false,
            entry: None,
        }
    }
}

/// Snapshot for observability. Fingerprints stay internal.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AdmissionStatus {
    pub config: AdmissionConfig,
    pub session_counts: HashMap<String, usize>,
}

/// Reason an interaction was turned away. Logged only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Disabled,
    QuotaExceeded,
    Duplicate,
    NotImportant,
    LowConfidence,
    ExcludedKind,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Disabled => write!(f, "disabled"),
            Rejection::QuotaExceeded => write!(f, "quota"),
            Rejection::Duplicate => write!(f, "duplicate"),
            Rejection::NotImportant => write!(f, "not-important"),
            Rejection::LowConfidence => write!(f, "low-confidence"),
            Rejection::ExcludedKind => write!(f, "excluded-kind"),
        }
    }
}

impl From<LedgerRefusal> for Rejection {
    fn from(refusal: LedgerRefusal) -> Self {
        match refusal {
            LedgerRefusal::QuotaExceeded => Rejection::QuotaExceeded,
            LedgerRefusal::Duplicate => Rejection::Duplicate,
        }
    }
}

/// Ask the classifier, turning any failure or timeout into
/// [`ClassificationResult::rejected`]. Verdicts are re-bounded whatever the
/// adapter did.
pub async fn classify_or_reject<C>(
    classifier: &C,
    request: &str,
    response: &str,
    timeout: Duration,
) -> ClassificationResult
where
    C: ImportanceClassifier + ?Sized,
{
    match tokio::time::timeout(timeout, classifier.classify(request, response)).await {
        Ok(Ok(result)) => result.bounded(),
        Ok(Err(e)) => {
            tracing::warn!(classifier = classifier.name(), "Classification failed: {}", e);
            ClassificationResult::rejected()
        }
        Err(_) => {
            tracing::warn!(
                classifier = classifier.name(),
                "Classification timed out after {:?}",
                timeout
            );
            ClassificationResult::rejected()
        }
    }
}

/// The admission gate. One instance per process owns the ledger.
pub struct AdmissionGate<C: ?Sized, S: ?Sized> {
    classifier: Arc<C>,
    store: Arc<S>,
    config: RwLock<AdmissionConfig>,
    ledger: SharedLedger,
    classifier_timeout: Duration,
}

impl<C, S> AdmissionGate<C, S>
where
    C: ImportanceClassifier + ?Sized,
    S: MemoryStore + ?Sized,
{
    pub fn new(classifier: Arc<C>, store: Arc<S>, config: AdmissionConfig) -> Self {
        Self {
            classifier,
            store,
            config: RwLock::new(config),
            ledger: Arc::new(Mutex::new(AdmissionLedger::default())),
            classifier_timeout: DEFAULT_CLASSIFIER_TIMEOUT,
        }
    }

    pub fn with_classifier_timeout(mut self, timeout: Duration) -> Self {
        self.classifier_timeout = timeout;
        self
    }

    /// Consistent copy of the live configuration
    pub fn config(&self) -> AdmissionConfig {
        self.config.read().clone()
    }

    /// Merge a partial update into the live configuration
    pub fn update_config(
        &self,
        update: AdmissionConfigUpdate,
    ) -> Result<AdmissionConfig, DomainError> {
        self.swap_config(update).map(|(_, config)| config)
    }

    /// Like [`update_config`](Self::update_config), also returning the
    /// deduplication window in force before the update. Both are read under
    /// one write guard.
    pub fn swap_config(
        &self,
        update: AdmissionConfigUpdate,
    ) -> Result<(u64, AdmissionConfig), DomainError> {
        let mut config = self.config.write();
        let previous_window = config.deduplication_window_minutes;
        config.apply(update)?;
        tracing::info!(config = ?*config, "Admission config updated");
        Ok((previous_window, config.clone()))
    }

    pub fn status(&self) -> AdmissionStatus {
        AdmissionStatus {
            config: self.config(),
            session_counts: self.ledger.lock().session_counts(),
        }
    }

    /// Forget every remembered fingerprint. Session counters are kept.
    pub fn expire_fingerprints(&self) -> usize {
        let cleared = self.ledger.lock().clear_fingerprints();
        tracing::debug!(cleared, "Deduplication window elapsed");
        cleared
    }

    /// Evaluate one interaction and save it when it passes every check.
    ///
    /// Classifier failures count as a rejection. Store failures while saving
    /// are returned to the caller and leave no trace in the ledger.
    pub async fn evaluate(
        &self,
        request: &str,
        response: &str,
        source: MemorySource,
    ) -> Result<AdmissionOutcome, DomainError> {
        let config = self.config();
        let session_key = source
            .session_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SESSION_KEY)
            .to_string();

        if !config.enabled {
            return Ok(self.reject(Rejection::Disabled, &session_key));
        }

        let request = truncate_chars(request, MAX_REQUEST_CHARS);
        let response = truncate_chars(response, MAX_RESPONSE_CHARS);
        let fingerprint = Fingerprint::of_interaction(request, response);

        let reservation = match Reservation::acquire(
            &self.ledger,
            &session_key,
            fingerprint,
            config.max_entries_per_session,
        ) {
            Ok(reservation) => reservation,
            Err(refusal) => return Ok(self.reject(refusal.into(), &session_key)),
        };

        let classification = classify_or_reject(
            self.classifier.as_ref(),
            request,
            response,
            self.classifier_timeout,
        )
        .await;

        if !classification.is_important {
            return Ok(self.reject(Rejection::NotImportant, &session_key));
        }
        if classification.confidence < config.min_confidence {
            return Ok(self.reject(Rejection::LowConfidence, &session_key));
        }
        if config.exclude_kinds.contains(&classification.kind) {
            return Ok(self.reject(Rejection::ExcludedKind, &session_key));
        }

        let new_entry = build_entry(classification, request, source);
        let saved = self.store.save(new_entry).await?;
        reservation.commit();

        tracing::info!(
            id = %saved.id,
            kind = %saved.kind,
            session = %session_key,
            %fingerprint,
            "Memory admitted: {}",
            truncate_chars(&saved.content, 50)
        );

        Ok(AdmissionOutcome::admitted(saved))
    }

    fn reject(&self, reason: Rejection, session_key: &str) -> AdmissionOutcome {
        tracing::debug!(%reason, session = %session_key, "Interaction not admitted");
        AdmissionOutcome::rejected()
    }
}

fn build_entry(
    classification: ClassificationResult,
    request: &str,
    source: MemorySource,
) -> NewMemoryEntry {
    let mut metadata = serde_json::json!({
        "confidence": classification.confidence,
        "original_request": truncate_chars(request, MAX_ORIGINAL_REQUEST_CHARS),
    });
    if let Some(context) = classification.context {
        metadata["context"] = serde_json::Value::String(context);
    }

    NewMemoryEntry::new(
        classification.kind,
        classification.summary,
        classification.tags,
        source,
    )
    .with_metadata(metadata)
}
