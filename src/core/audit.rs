//! In-memory audit sink
//!
//! Keeps every audit entry in arrival order and mirrors each one to the
//! `audit` tracing target.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::info;

use crate::core::traits::AuditSink;
use crate::types::{AuditEntry, AuditRecord};

#[derive(Debug)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
    next_id: AtomicU64,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Snapshot of every entry, oldest first
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for InMemoryAuditLog {
    fn record(&self, record: AuditRecord) {
        let entry = AuditEntry::from_record(self.next_id.fetch_add(1, Ordering::Relaxed), record);

        info!(
            target: "audit",
            id = entry.id,
            actor = entry.actor.id,
            action = %entry.action,
            target_kind = %entry.target_kind,
            target_id = entry.target_id,
            reason = entry.reason.as_deref().unwrap_or(""),
            details = %entry.details,
            "audit entry recorded"
        );

        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Actor, AuditAction, TargetKind};

    #[test]
    fn test_records_are_kept_in_order() {
        let log = InMemoryAuditLog::new();
        for target in [5, 6] {
            log.record(AuditRecord {
                actor: Actor { id: 9, email: None },
                action: AuditAction::UpdateUserStatus,
                target_kind: TargetKind::User,
                target_id: target,
                reason: None,
                details: "Status changed to: FROZEN".to_string(),
            });
        }

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, 1);
        assert_eq!(entries[0].target_id, 5);
        assert_eq!(entries[1].id, 2);
        assert_eq!(entries[1].target_id, 6);
    }
}
