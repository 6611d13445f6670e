//! Admission ledger - session counters and recent fingerprints
//!
//! Both structures sit behind one mutex. An evaluation reserves its session
//! slot and fingerprint before classification and commits them only once the
//! store accepted the entry, so concurrent evaluations cannot both pass the
//! quota or duplicate checks. Reservations are released on drop.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::Fingerprint;

/// Why a reservation was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LedgerRefusal {
    QuotaExceeded,
    Duplicate,
}

#[derive(Debug, Default)]
pub(crate) struct AdmissionLedger {
    session_counts: HashMap<String, usize>,
    pending_sessions: HashMap<String, usize>,
    fingerprints: HashSet<Fingerprint>,
    pending_fingerprints: HashSet<Fingerprint>,
}

impl AdmissionLedger {
    fn try_reserve(
        &mut self,
        session_key: &str,
        fingerprint: Fingerprint,
        max_per_session: usize,
    ) -> Result<(), LedgerRefusal> {
        let admitted = self.session_counts.get(session_key).copied().unwrap_or(0);
        let pending = self.pending_sessions.get(session_key).copied().unwrap_or(0);
        if admitted + pending >= max_per_session {
            return Err(LedgerRefusal::QuotaExceeded);
        }

        if self.fingerprints.contains(&fingerprint)
            || self.pending_fingerprints.contains(&fingerprint)
        {
            return Err(LedgerRefusal::Duplicate);
        }

        *self.pending_sessions.entry(session_key.to_string()).or_insert(0) += 1;
        self.pending_fingerprints.insert(fingerprint);
        Ok(())
    }

    fn release(&mut self, session_key: &str, fingerprint: Fingerprint) {
        if let Some(pending) = self.pending_sessions.get_mut(session_key) {
            *pending = pending.saturating_sub(1);
            if *pending == 0 {
                self.pending_sessions.remove(session_key);
            }
        }
        self.pending_fingerprints.remove(&fingerprint);
    }

    fn commit(&mut self, session_key: &str, fingerprint: Fingerprint) {
        self.release(session_key, fingerprint);
        *self.session_counts.entry(session_key.to_string()).or_insert(0) += 1;
        self.fingerprints.insert(fingerprint);
    }

    /// Drop every committed fingerprint. In-flight reservations survive.
    pub(crate) fn clear_fingerprints(&mut self) -> usize {
        let cleared = self.fingerprints.len();
        self.fingerprints.clear();
        cleared
    }

    pub(crate) fn session_counts(&self) -> HashMap<String, usize> {
        self.session_counts.clone()
    }
}

pub(crate) type SharedLedger = Arc<Mutex<AdmissionLedger>>;

/// A held session slot and fingerprint. Released on drop unless committed.
pub(crate) struct Reservation {
    ledger: SharedLedger,
    session_key: String,
    fingerprint: Fingerprint,
    settled: bool,
}

impl Reservation {
    pub(crate) fn acquire(
        ledger: &SharedLedger,
        session_key: &str,
        fingerprint: Fingerprint,
        max_per_session: usize,
    ) -> Result<Self, LedgerRefusal> {
        ledger
            .lock()
            .try_reserve(session_key, fingerprint, max_per_session)?;

        Ok(Self {
            ledger: Arc::clone(ledger),
            session_key: session_key.to_string(),
            fingerprint,
            settled: false,
        })
    }

    /// Count the admission and remember the fingerprint
    pub(crate) fn commit(mut self) {
        self.ledger.lock().commit(&self.session_key, self.fingerprint);
        self.settled = true;
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if !self.settled {
            self.ledger.lock().release(&self.session_key, self.fingerprint);
        }
    }
}
