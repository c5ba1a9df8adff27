// File: src/repositories/memory.rs

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use async_trait::async_trait;

use couponbook_common::models::Ledger;
use couponbook_common::traits::LedgerRepository;
use crate::Error;

/// Keeps the ledger in memory only. Useful for throwaway sessions and for
/// exercising write failures.
#[derive(Default)]
pub struct InMemoryLedgerRepository {
    stored: Mutex<Ledger>,
    fail_writes: AtomicBool,
    persist_count: AtomicUsize,
}

impl InMemoryLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger(ledger: Ledger) -> Self {
        Self { stored: Mutex::new(ledger), ..Self::default() }
    }

    /// While set, `persist` fails with `PersistenceUnavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Ledger {
        self.stored.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Number of successful writes.
    pub fn persist_count(&self) -> usize {
        self.persist_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn load(&self) -> Ledger {
        self.stored()
    }

    async fn persist(&self, ledger: &Ledger) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::PersistenceUnavailable("in-memory store is read-only".into()));
        }
        let mut guard = self
            .stored
            .lock()
            .map_err(|_| Error::PersistenceUnavailable("ledger lock poisoned".into()))?;
        *guard = ledger.clone();
        self.persist_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
