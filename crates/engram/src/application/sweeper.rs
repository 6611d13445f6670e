//! Fingerprint Sweeper - Fixed-cadence deduplication window
//!
//! Clears all remembered fingerprints at once every window. An entry admitted
//! just before a sweep gets almost no duplicate protection; one admitted just
//! after gets nearly the full window.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;

use super::admission::AdmissionGate;
use crate::domain::MAX_DEDUP_WINDOW_MINUTES;
use crate::ports::{ImportanceClassifier, MemoryStore};

/// Convert the configured window into a timer period
pub fn window_period(minutes: u64) -> Duration {
    let minutes = minutes.clamp(1, MAX_DEDUP_WINDOW_MINUTES);
    Duration::from_secs(minutes.saturating_mul(60))
}

/// Background task that expires the gate's fingerprints
pub struct FingerprintSweeper<C: ?Sized, S: ?Sized> {
    gate: Arc<AdmissionGate<C, S>>,
    period: Duration,
}

impl<C, S> FingerprintSweeper<C, S>
where
    C: ImportanceClassifier + ?Sized + 'static,
    S: MemoryStore + ?Sized + 'static,
{
    pub fn new(gate: Arc<AdmissionGate<C, S>>, period: Duration) -> Self {
        Self { gate, period }
    }

    /// Start the sweeper (runs in background until aborted)
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        tracing::info!("Fingerprint sweeper started (period: {:?})", self.period);

        let mut ticker = interval(self.period);

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let cleared = self.gate.expire_fingerprints();
            tracing::debug!("Sweeper cleared {} fingerprints", cleared);
        }
    }
}
