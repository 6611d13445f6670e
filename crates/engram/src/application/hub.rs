//! Memory Hub - The caller-facing context object
//!
//! Built once at process start and shared (usually behind an `Arc`). Owns the
//! admission gate, the retrieval facade and the fingerprint sweeper's
//! lifecycle; there is no module-level state.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::admission::{AdmissionGate, AdmissionOutcome, AdmissionStatus};
use super::retrieval::{
    DirectSave, HealthReport, RecentParams, RecentResponse, RetrievalService, SearchParams,
    SearchResponse, StatsView,
};
use super::sweeper::{window_period, FingerprintSweeper};
use crate::domain::{
    AdmissionConfig, AdmissionConfigUpdate, DomainError, MemoryEntry, MemorySource,
};
use crate::ports::{ImportanceClassifier, MemoryStore};

pub struct MemoryHub<C: ?Sized, S: ?Sized> {
    gate: Arc<AdmissionGate<C, S>>,
    retrieval: RetrievalService<S>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<C, S> MemoryHub<C, S>
where
    C: ImportanceClassifier + ?Sized + 'static,
    S: MemoryStore + ?Sized + 'static,
{
    pub fn new(classifier: Arc<C>, store: Arc<S>, config: AdmissionConfig) -> Self {
        Self::from_gate(AdmissionGate::new(classifier, Arc::clone(&store), config), store)
    }

    /// Build around a pre-configured gate (e.g. with a custom classifier timeout)
    pub fn from_gate(gate: AdmissionGate<C, S>, store: Arc<S>) -> Self {
        Self {
            gate: Arc::new(gate),
            retrieval: RetrievalService::new(store),
            sweeper: Mutex::new(None),
        }
    }

    pub fn with_classifier_timeout(
        classifier: Arc<C>,
        store: Arc<S>,
        config: AdmissionConfig,
        timeout: Duration,
    ) -> Self {
        let gate = AdmissionGate::new(classifier, Arc::clone(&store), config)
            .with_classifier_timeout(timeout);
        Self::from_gate(gate, store)
    }

    // ============================================
    // Lifecycle
    // ============================================

    /// Start the fingerprint sweeper. Must be called inside a tokio runtime.
    /// Restarts the sweeper if it is already running.
    pub fn start(&self) {
        let mut sweeper = self.sweeper.lock();
        let window = self.gate.config().deduplication_window_minutes;
        self.restart_sweeper(&mut sweeper, window);
    }

    fn restart_sweeper(&self, slot: &mut Option<JoinHandle<()>>, window_minutes: u64) {
        let period = window_period(window_minutes);
        let handle = FingerprintSweeper::new(Arc::clone(&self.gate), period).start();
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Stop background work. Entries already saved are untouched.
    pub fn shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
            tracing::info!("Fingerprint sweeper stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // ============================================
    // Ingestion
    // ============================================

    pub async fn evaluate_interaction(
        &self,
        request: &str,
        response: &str,
        source: MemorySource,
    ) -> Result<AdmissionOutcome, DomainError> {
        self.gate.evaluate(request, response, source).await
    }

    pub async fn save_directly(&self, request: DirectSave) -> Result<MemoryEntry, DomainError> {
        self.retrieval.save(request).await
    }

    // ============================================
    // Retrieval
    // ============================================

    pub async fn search(&self, params: SearchParams) -> Result<SearchResponse, DomainError> {
        self.retrieval.search(params).await
    }

    pub async fn recent(&self, params: RecentParams) -> Result<RecentResponse, DomainError> {
        self.retrieval.recent(params).await
    }

    pub async fn stats(&self) -> Result<StatsView, DomainError> {
        self.retrieval.stats().await
    }

    pub async fn delete(&self, id: &str) -> Result<(), DomainError> {
        self.retrieval.delete(id).await
    }

    pub async fn health(&self) -> HealthReport {
        self.retrieval.health().await
    }

    // ============================================
    // Admission control
    // ============================================

    pub fn status(&self) -> AdmissionStatus {
        self.gate.status()
    }

    /// Apply a partial config update. A new deduplication window restarts a
    /// running sweeper with the new period.
    pub fn update_config(
        &self,
        update: AdmissionConfigUpdate,
    ) -> Result<AdmissionConfig, DomainError> {
        // Held across the swap so concurrent updates restart in order
        let mut sweeper = self.sweeper.lock();
        let (previous_window, config) = self.gate.swap_config(update)?;

        let running = sweeper.as_ref().is_some_and(|h| !h.is_finished());
        if running && config.deduplication_window_minutes != previous_window {
            self.restart_sweeper(&mut sweeper, config.deduplication_window_minutes);
        }
        Ok(config)
    }

    /// Expire fingerprints now, as the sweeper would
    pub fn expire_fingerprints(&self) -> usize {
        self.gate.expire_fingerprints()
    }
}

impl<C: ?Sized, S: ?Sized> Drop for MemoryHub<C, S> {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}
