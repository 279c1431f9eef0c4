use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::domain::ApplicantId;

/// Storage abstraction so the ledger can run on a file in production and in
/// memory during tests and demos.
pub trait LedgerStore: Send + Sync {
    fn load(&self) -> Result<BTreeMap<ApplicantId, Vec<i64>>, LedgerError>;
    fn persist(&self, entries: &BTreeMap<ApplicantId, Vec<i64>>) -> Result<(), LedgerError>;
}

/// Error enumeration for ledger failures.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("submission quota of {limit} reached")]
    QuotaExceeded { limit: usize },
    #[error("ledger store unavailable: {0}")]
    Store(String),
}

/// Per-applicant submission counter enforcing a hard quota.
///
/// The whole check-append-persist cycle runs under one lock, so two
/// concurrent submissions for the same applicant cannot both pass the quota
/// check. Timestamps are epoch milliseconds and are never expired or
/// decremented; a slot consumed by a later-rejected application stays
/// consumed.
pub struct SubmissionLedger<S> {
    store: S,
    quota: usize,
    entries: Mutex<BTreeMap<ApplicantId, Vec<i64>>>,
}

impl<S: LedgerStore> SubmissionLedger<S> {
    /// Load previously persisted entries from the store.
    pub fn open(store: S, quota: usize) -> Result<Self, LedgerError> {
        let entries = store.load()?;
        Ok(Self {
            store,
            quota,
            entries: Mutex::new(entries),
        })
    }

    /// Record a submission timestamp unless the applicant exhausted the quota.
    ///
    /// Returns the new submission count. The full ledger is rewritten to the
    /// store before returning; on a quota refusal nothing is mutated.
    pub fn record_if_allowed(
        &self,
        applicant: &ApplicantId,
        now_ms: i64,
    ) -> Result<usize, LedgerError> {
        let mut entries = self.entries.lock().expect("ledger mutex poisoned");
        let recorded = entries.get(applicant).map_or(0, Vec::len);
        if recorded >= self.quota {
            return Err(LedgerError::QuotaExceeded { limit: self.quota });
        }

        let timestamps = entries.entry(applicant.clone()).or_default();
        timestamps.push(now_ms);
        let count = timestamps.len();
        self.store.persist(&entries)?;
        Ok(count)
    }

    /// Number of submissions recorded for the applicant.
    pub fn count(&self, applicant: &ApplicantId) -> usize {
        self.entries
            .lock()
            .expect("ledger mutex poisoned")
            .get(applicant)
            .map_or(0, Vec::len)
    }
}

/// Flat JSON document keyed by applicant identity, each value an ordered list
/// of submission timestamps.
pub struct FileLedgerStore {
    path: PathBuf,
}

impl FileLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LedgerStore for FileLedgerStore {
    fn load(&self) -> Result<BTreeMap<ApplicantId, Vec<i64>>, LedgerError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let raw = fs::read_to_string(&self.path)
            .map_err(|err| LedgerError::Store(err.to_string()))?;
        serde_json::from_str(&raw).map_err(|err| LedgerError::Store(err.to_string()))
    }

    fn persist(&self, entries: &BTreeMap<ApplicantId, Vec<i64>>) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| LedgerError::Store(err.to_string()))?;
            }
        }

        let raw = serde_json::to_string_pretty(entries)
            .map_err(|err| LedgerError::Store(err.to_string()))?;
        fs::write(&self.path, raw).map_err(|err| LedgerError::Store(err.to_string()))
    }
}

/// In-memory store backing the demo runner and tests. Clones share state so a
/// caller can keep a handle and inspect what the ledger persisted.
#[derive(Default, Clone)]
pub struct MemoryLedgerStore {
    entries: Arc<Mutex<BTreeMap<ApplicantId, Vec<i64>>>>,
}

impl MemoryLedgerStore {
    /// Timestamps last persisted for the applicant, empty if none.
    pub fn persisted(&self, applicant: &ApplicantId) -> Vec<i64> {
        self.entries
            .lock()
            .expect("ledger store mutex poisoned")
            .get(applicant)
            .cloned()
            .unwrap_or_default()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self) -> Result<BTreeMap<ApplicantId, Vec<i64>>, LedgerError> {
        Ok(self
            .entries
            .lock()
            .expect("ledger store mutex poisoned")
            .clone())
    }

    fn persist(&self, entries: &BTreeMap<ApplicantId, Vec<i64>>) -> Result<(), LedgerError> {
        *self.entries.lock().expect("ledger store mutex poisoned") = entries.clone();
        Ok(())
    }
}
