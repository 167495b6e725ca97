//! Rust Transfer Engine Library
//! # Overview
//!
//! Peer-to-peer money transfers between customers of a bank, with a
//! threshold-based fraud hold and an admin review step that releases or
//! refunds held funds. A CSV replay surface drives the core through both a
//! sync and an async strategy.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (User, Account, LedgerEntry, errors, requests)
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Transfer orchestration
//!   - [`core::fraud_resolution`] - Admin approval or blocking of held transfers
//!   - [`core::account_store`] - Balances with atomic multi-account updates
//!   - [`core::identity`] - Recipient resolution by email, account number,
//!     customer id, public handle or mobile number
//!   - [`core::ledger`] - Two immutable legs per transfer
//! - [`io`] - CSV journals in, CSV reports out
//! - [`strategy`] - Sync and async replay pipelines
//! - [`cli`], [`config`], [`logging`] - Process surface
//!
//! # Transfer flow
//!
//! ```text
//! PIN check → resolve recipient → reject self → validate amount
//!   → lock both parties → debit sender → risk policy
//!       ├── NONE    → credit recipient
//!       └── PENDING → hold (recipient untouched until an admin decides)
//!   → record sent + received legs → commit
//! ```
//!
//! # Fraud status
//!
//! - **NONE**: settled immediately
//! - **PENDING**: amount above the threshold, funds held
//! - **APPROVED**: held funds credited to the recipient
//! - **BLOCKED**: held funds refunded to the sender

pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use config::{EngineConfig, LogConfig};
pub use core::{BankCore, FraudResolutionService, TransferEngine, UserStatusService};
pub use io::write_accounts_csv;
pub use types::{
    Account, AccountId, FraudStatus, LedgerEntry, ReplayCommand, TransferError,
    TransferRequest, User, UserId,
};
