//! Core traits for the collaborators of the transfer engine
//!
//! This module defines the seams the engine is wired through. The in-memory
//! implementations in this crate back the replay CLI and the tests; a
//! database-backed implementation can be swapped in without touching the
//! engine or the fraud resolution service.
//!
//! The account store is deliberately not a trait: its ordered-lock unit of
//! work is what makes transfers atomic.

use rust_decimal::Decimal;

use crate::types::{
    AuditRecord, EntryId, FraudStatus, LedgerEntry, NewLedgerEntry, TransferError, TransferId,
    User, UserId, UserStatus,
};

/// Directory of users addressable as transfer recipients
pub trait UserDirectory: Send + Sync {
    /// Resolve a recipient identifier to exactly one user
    ///
    /// Identifier classes are tried in priority order (email, account number,
    /// customer id, public handle, mobile number) and resolution stops at the
    /// first exact match. Blank identifiers never match.
    ///
    /// # Errors
    ///
    /// `RecipientNotFound` if no class matches.
    fn resolve(&self, identifier: &str) -> Result<User, TransferError>;

    /// Look up a user by id
    fn get(&self, id: UserId) -> Option<User>;

    /// Set a user's administrative status, returning the previous one
    fn set_status(&self, id: UserId, status: UserStatus) -> Result<UserStatus, TransferError>;
}

/// Append-only store of ledger entries
///
/// Entries are immutable except for their fraud status and flagged reason.
pub trait LedgerStore: Send + Sync {
    /// Record both legs of one transfer atomically
    ///
    /// # Returns
    ///
    /// The stored `(sent, received)` legs, in that order.
    fn append_pair(
        &self,
        sent: NewLedgerEntry,
        received: NewLedgerEntry,
    ) -> Result<(LedgerEntry, LedgerEntry), TransferError>;

    /// Record a single entry (external credits)
    fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, TransferError>;

    fn get(&self, id: EntryId) -> Option<LedgerEntry>;

    /// Both legs sharing a correlation id, ordered by entry id
    fn legs(&self, transfer_id: &TransferId) -> Vec<LedgerEntry>;

    /// Every entry owned by a user, newest first
    fn entries_for(&self, owner: UserId) -> Vec<LedgerEntry>;

    /// Entries currently held for review
    fn flagged(&self) -> Vec<LedgerEntry>;

    /// Replace an entry's fraud status
    ///
    /// # Returns
    ///
    /// The status the entry had before the update.
    ///
    /// # Errors
    ///
    /// `TransactionNotFound` if the entry does not exist.
    fn set_fraud_status(
        &self,
        id: EntryId,
        status: FraudStatus,
        reason: Option<String>,
    ) -> Result<FraudStatus, TransferError>;

    /// Every entry, ordered by entry id
    fn all(&self) -> Vec<LedgerEntry>;
}

/// Write-only sink for administrative audit records
///
/// Fire-and-forget from the core's point of view: durability is the sink's
/// own concern and a sink never fails the operation it audits.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

/// Outcome of a risk evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub status: FraudStatus,
    pub reason: Option<String>,
}

impl RiskAssessment {
    pub fn clear() -> Self {
        RiskAssessment {
            status: FraudStatus::None,
            reason: None,
        }
    }

    pub fn hold(reason: impl Into<String>) -> Self {
        RiskAssessment {
            status: FraudStatus::Pending,
            reason: Some(reason.into()),
        }
    }
}

/// Decides whether a transfer settles immediately or is held for review
pub trait RiskPolicy: Send + Sync {
    fn evaluate(&self, amount: Decimal, sender: &User, recipient: &User) -> RiskAssessment;
}

/// Checks the security PIN presented with a transfer
pub trait PinVerifier: Send + Sync {
    fn verify(&self, user: &User, pin: &str) -> bool;
}
