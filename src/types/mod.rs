//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account state
//! - `user`: Users and their recipient identifiers
//! - `ledger`: Ledger entries, correlation ids and fraud status
//! - `audit`: Administrative audit records
//! - `request` / `response`: Inbound requests and outbound views
//! - `command`: Replayable journal commands
//! - `error`: Error types for the transfer engine

pub mod account;
pub mod audit;
pub mod command;
pub mod error;
pub mod ledger;
pub mod request;
pub mod response;
pub mod user;

pub use account::{Account, AccountId};
pub use audit::{Actor, AuditAction, AuditEntry, AuditRecord, TargetKind};
pub use command::{EntryRef, ReplayCommand};
pub use error::TransferError;
pub use ledger::{
    Direction, EntryId, EntryKind, EntryStatus, FraudStatus, LedgerEntry, NewLedgerEntry,
    TransferId,
};
pub use request::{FraudResolutionRequest, TransferRequest};
pub use response::{ResolutionResponse, TransactionView, TransferResponse, RESOLUTION_CONFIRMATION};
pub use user::{IdentifierKind, Role, User, UserId, UserStatus};
