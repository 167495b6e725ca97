//! Core business logic module
//!
//! This module contains the transfer and fraud-review components:
//! - `traits` - Trait abstractions for interchangeable collaborators
//! - `account_store` - Account balances with atomic multi-account updates
//! - `identity` - User directory and recipient resolution
//! - `ledger` - Double-entry ledger storage
//! - `risk` / `pin` - Pluggable transfer policies
//! - `audit` - In-memory audit trail
//! - `engine` - Transfer orchestration
//! - `fraud_resolution` - Admin decisions on held transfers
//! - `user_admin` - Admin changes to user status
//! - `bank` - Composition root wiring all of the above
//! - `processor` / `batch_processor` - Replay command dispatch

pub mod account_store;
pub mod audit;
pub mod bank;
pub mod batch_processor;
pub mod engine;
pub mod fraud_resolution;
pub mod identity;
pub mod ledger;
pub mod pin;
pub mod processor;
pub mod risk;
pub mod traits;
pub mod user_admin;

pub use account_store::{AccountStore, AccountTxn};
pub use audit::InMemoryAuditLog;
pub use bank::BankCore;
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use engine::TransferEngine;
pub use fraud_resolution::{FraudResolutionService, ResolutionOutcome, Settlement};
pub use identity::InMemoryDirectory;
pub use ledger::InMemoryLedger;
pub use pin::FormatPinCheck;
pub use processor::{CommandOutcome, CommandProcessor, ReplayStats};
pub use risk::ThresholdPolicy;
pub use traits::{AuditSink, LedgerStore, PinVerifier, RiskAssessment, RiskPolicy, UserDirectory};
pub use user_admin::UserStatusService;
