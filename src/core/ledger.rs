//! In-memory ledger recorder
//!
//! Stores ledger entries keyed by entry id. Ids are handed out from an atomic
//! counter, so the two legs of a transfer always get consecutive ids with the
//! sent leg first.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::core::traits::LedgerStore;
use crate::types::{
    EntryId, FraudStatus, LedgerEntry, NewLedgerEntry, TransferError, TransferId, UserId,
};

/// Thread-safe ledger backed by `DashMap`
#[derive(Debug)]
pub struct InMemoryLedger {
    entries: DashMap<EntryId, LedgerEntry>,
    next_id: AtomicU64,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    fn collect_sorted(&self, filter: impl Fn(&LedgerEntry) -> bool) -> Vec<LedgerEntry> {
        let mut entries: Vec<LedgerEntry> = self
            .entries
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by_key(|entry| entry.id);
        entries
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for InMemoryLedger {
    fn append_pair(
        &self,
        sent: NewLedgerEntry,
        received: NewLedgerEntry,
    ) -> Result<(LedgerEntry, LedgerEntry), TransferError> {
        if sent.transfer_id != received.transfer_id {
            return Err(TransferError::storage_failure(format!(
                "legs carry different transfer ids ({} / {})",
                sent.transfer_id, received.transfer_id
            )));
        }

        let first = self.next_id.fetch_add(2, Ordering::Relaxed);
        let sent = LedgerEntry::from_new(first, sent);
        let received = LedgerEntry::from_new(first + 1, received);

        self.entries.insert(sent.id, sent.clone());
        self.entries.insert(received.id, received.clone());
        Ok((sent, received))
    }

    fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, TransferError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let entry = LedgerEntry::from_new(id, entry);
        self.entries.insert(id, entry.clone());
        Ok(entry)
    }

    fn get(&self, id: EntryId) -> Option<LedgerEntry> {
        self.entries.get(&id).map(|entry| entry.value().clone())
    }

    fn legs(&self, transfer_id: &TransferId) -> Vec<LedgerEntry> {
        self.collect_sorted(|entry| &entry.transfer_id == transfer_id)
    }

    fn entries_for(&self, owner: UserId) -> Vec<LedgerEntry> {
        let mut entries = self.collect_sorted(|entry| entry.owner == owner);
        entries.reverse();
        entries
    }

    fn flagged(&self) -> Vec<LedgerEntry> {
        self.collect_sorted(|entry| entry.fraud_status.is_held())
    }

    fn set_fraud_status(
        &self,
        id: EntryId,
        status: FraudStatus,
        reason: Option<String>,
    ) -> Result<FraudStatus, TransferError> {
        let mut entry = self
            .entries
            .get_mut(&id)
            .ok_or_else(|| TransferError::transaction_not_found(id))?;

        let previous = std::mem::replace(&mut entry.fraud_status, status);
        if reason.is_some() {
            entry.flagged_reason = reason;
        }
        Ok(previous)
    }

    fn all(&self) -> Vec<LedgerEntry> {
        self.collect_sorted(|_| true)
    }
}
