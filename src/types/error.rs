//! Error types for the transfer engine
//!
//! Every failure the core can produce is a `TransferError` variant with enough
//! context to explain itself. None of them are swallowed: the engine returns
//! them to the caller, and the replay layer logs them per command.
//!
//! # Error Categories
//!
//! - **Request Errors**: invalid amount, invalid PIN, malformed status
//! - **Resolution Errors**: unknown recipient, self-transfer, unknown user
//! - **Balance Errors**: insufficient balance, arithmetic overflow
//! - **Lookup Errors**: missing account, missing ledger entry
//! - **Storage Errors**: any persistence failure (rolls back the unit of work)
//! - **Replay Errors**: a journal command naming an unknown transfer label

use rust_decimal::Decimal;
use thiserror::Error;

use super::account::AccountId;
use super::ledger::EntryId;
use super::user::{IdentifierKind, UserId};

/// Main error type for the transfer engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransferError {
    /// Amount is zero or negative
    #[error("Transfer amount must be positive, got {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// The supplied PIN did not pass verification
    #[error("Invalid Security PIN. Please enter any 4 digits.")]
    InvalidPin,

    /// No user matches the recipient identifier
    #[error("Recipient not found for identifier '{identifier}'")]
    RecipientNotFound {
        /// The identifier that did not resolve
        identifier: String,
    },

    /// The resolved recipient is the sender
    #[error("Cannot transfer to yourself (user {user})")]
    SelfTransfer {
        /// The sending (and receiving) user
        user: UserId,
    },

    /// The sender account cannot cover the amount
    #[error("Insufficient balance in account {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        /// The debited account
        account: AccountId,
        /// Balance at check time
        available: Decimal,
        /// Requested amount
        requested: Decimal,
    },

    /// The party has no (matching) active account
    #[error("No active account found for user {owner}")]
    AccountNotFound {
        /// The owner that was looked up
        owner: UserId,
    },

    /// No ledger entry with the given id exists
    #[error("Transaction {entry} not found")]
    TransactionNotFound {
        /// The ledger entry id
        entry: EntryId,
    },

    /// The underlying persistence failed; the unit of work was rolled back
    #[error("Storage failure: {message}")]
    StorageFailure {
        /// Description of the failure
        message: String,
    },

    /// Checked decimal arithmetic failed
    #[error("Arithmetic overflow in {operation} on account {account}")]
    ArithmeticOverflow {
        /// Operation that overflowed
        operation: String,
        /// Account involved
        account: AccountId,
    },

    /// No user with the given id exists
    #[error("User {user} not found")]
    UserNotFound {
        /// The user id that was looked up
        user: UserId,
    },

    /// The acting user lacks the admin role
    #[error("User {user} is not allowed to perform {operation}")]
    Forbidden {
        /// The acting user
        user: UserId,
        /// The attempted operation
        operation: String,
    },

    /// A user identifier is already taken by another user
    #[error("Identifier '{value}' ({kind}) is already registered to user {owner}")]
    DuplicateIdentifier {
        /// Identifier class of the new value
        kind: IdentifierKind,
        /// The conflicting value
        value: String,
        /// The user already holding it
        owner: UserId,
    },

    /// A status string did not name a known status
    #[error("Invalid status '{value}'")]
    InvalidStatus {
        /// The rejected status string
        value: String,
    },

    /// A replayed command referred to a label no earlier transfer produced
    #[error("Unknown transaction reference '{label}'")]
    UnknownReference {
        /// The unresolved label
        label: String,
    },
}

impl TransferError {
    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount { .. } => "INVALID_AMOUNT",
            TransferError::InvalidPin => "INVALID_PIN",
            TransferError::RecipientNotFound { .. } => "RECIPIENT_NOT_FOUND",
            TransferError::SelfTransfer { .. } => "SELF_TRANSFER",
            TransferError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            TransferError::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            TransferError::TransactionNotFound { .. } => "TRANSACTION_NOT_FOUND",
            TransferError::StorageFailure { .. } => "STORAGE_FAILURE",
            TransferError::ArithmeticOverflow { .. } => "ARITHMETIC_OVERFLOW",
            TransferError::UserNotFound { .. } => "USER_NOT_FOUND",
            TransferError::Forbidden { .. } => "FORBIDDEN",
            TransferError::DuplicateIdentifier { .. } => "DUPLICATE_IDENTIFIER",
            TransferError::InvalidStatus { .. } => "INVALID_STATUS",
            TransferError::UnknownReference { .. } => "UNKNOWN_REFERENCE",
        }
    }

    /// HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::InvalidAmount { .. }
            | TransferError::InvalidPin
            | TransferError::InvalidStatus { .. } => 400,
            TransferError::Forbidden { .. } => 403,
            TransferError::RecipientNotFound { .. }
            | TransferError::AccountNotFound { .. }
            | TransferError::TransactionNotFound { .. }
            | TransferError::UserNotFound { .. }
            | TransferError::UnknownReference { .. } => 404,
            TransferError::InsufficientBalance { .. } => 406,
            TransferError::SelfTransfer { .. } | TransferError::DuplicateIdentifier { .. } => 409,
            TransferError::StorageFailure { .. } | TransferError::ArithmeticOverflow { .. } => 500,
        }
    }
}

// Helper functions for creating common errors

impl TransferError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal) -> Self {
        TransferError::InvalidAmount { amount }
    }

    /// Create a RecipientNotFound error
    pub fn recipient_not_found(identifier: &str) -> Self {
        TransferError::RecipientNotFound {
            identifier: identifier.to_string(),
        }
    }

    /// Create a SelfTransfer error
    pub fn self_transfer(user: UserId) -> Self {
        TransferError::SelfTransfer { user }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(account: AccountId, available: Decimal, requested: Decimal) -> Self {
        TransferError::InsufficientBalance {
            account,
            available,
            requested,
        }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(owner: UserId) -> Self {
        TransferError::AccountNotFound { owner }
    }

    /// Create a TransactionNotFound error
    pub fn transaction_not_found(entry: EntryId) -> Self {
        TransferError::TransactionNotFound { entry }
    }

    /// Create a StorageFailure error
    pub fn storage_failure(message: impl Into<String>) -> Self {
        TransferError::StorageFailure {
            message: message.into(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        TransferError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    /// Create a UserNotFound error
    pub fn user_not_found(user: UserId) -> Self {
        TransferError::UserNotFound { user }
    }

    /// Create a Forbidden error
    pub fn forbidden(user: UserId, operation: &str) -> Self {
        TransferError::Forbidden {
            user,
            operation: operation.to_string(),
        }
    }

    /// Create a DuplicateIdentifier error
    pub fn duplicate_identifier(kind: IdentifierKind, value: &str, owner: UserId) -> Self {
        TransferError::DuplicateIdentifier {
            kind,
            value: value.to_string(),
            owner,
        }
    }

    /// Create an InvalidStatus error
    pub fn invalid_status(value: &str) -> Self {
        TransferError::InvalidStatus {
            value: value.to_string(),
        }
    }

    /// Create an UnknownReference error
    pub fn unknown_reference(label: &str) -> Self {
        TransferError::UnknownReference {
            label: label.to_string(),
        }
    }
}
