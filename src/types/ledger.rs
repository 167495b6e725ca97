//! Ledger entry types
//!
//! Every transfer produces two ledger entries (one per party) that share a
//! `TransferId`. Entries are immutable value records except for their fraud
//! status, which only the fraud resolution service changes.

use super::account::AccountId;
use super::error::TransferError;
use super::user::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ledger entry identifier
///
/// Assigned by the ledger store; one per leg.
pub type EntryId = u64;

/// Correlation id shared by both legs of one transfer (e.g. `TX01J9ZK4M`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransferId(String);

impl TransferId {
    /// Generate a fresh correlation id
    ///
    /// Uses the random tail of a ULID so ids do not leak creation order.
    pub fn generate() -> Self {
        let ulid = ulid::Ulid::new().to_string();
        TransferId(format!("TX{}", &ulid[ulid.len() - 8..]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TransferId {
    fn from(value: &str) -> Self {
        TransferId(value.to_string())
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of a transfer an entry describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Sent => "sent",
            Direction::Received => "received",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a ledger entry
///
/// Both legs are `Completed` regardless of the fraud outcome; fraud is
/// tracked separately in [`FraudStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Completed,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Completed => "completed",
        }
    }
}

/// Fraud review status of a ledger entry
///
/// ```text
/// NONE                      (terminal, normal path)
/// PENDING ──► APPROVED      (terminal, held funds credited to recipient)
///         └─► BLOCKED       (terminal, held funds refunded to sender)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FraudStatus {
    None,
    Pending,
    Approved,
    Blocked,
}

impl FraudStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FraudStatus::None => "NONE",
            FraudStatus::Pending => "PENDING",
            FraudStatus::Approved => "APPROVED",
            FraudStatus::Blocked => "BLOCKED",
        }
    }

    /// Whether funds for this entry are currently held
    #[inline]
    pub fn is_held(&self) -> bool {
        matches!(self, FraudStatus::Pending)
    }

    /// Whether an administrator may set this status on an entry
    #[inline]
    pub fn is_decision(&self) -> bool {
        matches!(self, FraudStatus::Approved | FraudStatus::Blocked)
    }
}

impl fmt::Display for FraudStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FraudStatus {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(FraudStatus::None),
            "PENDING" => Ok(FraudStatus::Pending),
            "APPROVED" => Ok(FraudStatus::Approved),
            "BLOCKED" => Ok(FraudStatus::Blocked),
            _ => Err(TransferError::invalid_status(s)),
        }
    }
}

/// What produced the entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// One leg of a customer-to-customer transfer
    Transfer,
    /// A simulated external credit (no counterparty)
    Credit,
}

/// A ledger entry before the store assigns its id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewLedgerEntry {
    pub transfer_id: TransferId,
    pub owner: UserId,
    pub owner_name: String,
    pub counterparty: Option<UserId>,
    pub counterparty_name: Option<String>,
    pub account: AccountId,
    pub amount: Decimal,
    pub direction: Direction,
    pub kind: EntryKind,
    pub description: String,
    pub category: String,
    pub fraud_status: FraudStatus,
    pub flagged_reason: Option<String>,
}

/// One party's record of a transfer or credit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    /// Store-assigned id, unique per leg
    pub id: EntryId,

    /// Correlation id shared by both legs of one transfer
    pub transfer_id: TransferId,

    /// The party whose view this entry is
    pub owner: UserId,
    pub owner_name: String,

    /// The other party; `None` for external credits
    pub counterparty: Option<UserId>,
    pub counterparty_name: Option<String>,

    /// The owner's account the amount moved through
    pub account: AccountId,

    /// Always positive; the sign is implied by `direction`
    pub amount: Decimal,

    pub direction: Direction,
    pub kind: EntryKind,
    pub description: String,
    pub category: String,
    pub status: EntryStatus,
    pub fraud_status: FraudStatus,
    pub flagged_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Materialize a pending entry with its store-assigned id
    pub fn from_new(id: EntryId, entry: NewLedgerEntry) -> Self {
        LedgerEntry {
            id,
            transfer_id: entry.transfer_id,
            owner: entry.owner,
            owner_name: entry.owner_name,
            counterparty: entry.counterparty,
            counterparty_name: entry.counterparty_name,
            account: entry.account,
            amount: entry.amount,
            direction: entry.direction,
            kind: entry.kind,
            description: entry.description,
            category: entry.category,
            status: EntryStatus::Completed,
            fraud_status: entry.fraud_status,
            flagged_reason: entry.flagged_reason,
            created_at: Utc::now(),
        }
    }

    /// `transfer` for sent legs, `deposit` for everything received
    pub fn transaction_type(&self) -> &'static str {
        match self.direction {
            Direction::Sent => "transfer",
            Direction::Received => "deposit",
        }
    }

    /// Name of the paying party
    pub fn sender_name(&self) -> &str {
        match self.direction {
            Direction::Sent => &self.owner_name,
            Direction::Received => self.counterparty_name.as_deref().unwrap_or("Unknown"),
        }
    }

    /// Name of the receiving party
    pub fn recipient_name(&self) -> &str {
        match self.direction {
            Direction::Sent => self.counterparty_name.as_deref().unwrap_or("Unknown"),
            Direction::Received => &self.owner_name,
        }
    }
}
