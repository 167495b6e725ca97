//! Inbound request types
//!
//! Requests carry what the caller supplies; the authenticated acting user is
//! passed alongside, never inside, so a request cannot impersonate anyone.

use super::account::AccountId;
use super::ledger::{EntryId, FraudStatus};
use rust_decimal::Decimal;

/// A customer's request to move money to another customer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    /// Email, account number, customer id, public handle or mobile number
    pub recipient: String,

    /// Must be positive
    pub amount: Decimal,

    pub description: String,

    /// Falls back to the configured default category when absent or blank
    pub category: Option<String>,

    /// Security PIN, checked by the engine's `PinVerifier`
    pub pin: String,

    /// Debit this account instead of the sender's first active account
    pub sender_account: Option<AccountId>,
}

impl TransferRequest {
    pub fn new(recipient: impl Into<String>, amount: Decimal, pin: impl Into<String>) -> Self {
        TransferRequest {
            recipient: recipient.into(),
            amount,
            description: String::new(),
            category: None,
            pin: pin.into(),
            sender_account: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_sender_account(mut self, account: AccountId) -> Self {
        self.sender_account = Some(account);
        self
    }
}

/// An administrator's decision on a ledger entry's fraud status
#[derive(Debug, Clone, PartialEq)]
pub struct FraudResolutionRequest {
    pub entry: EntryId,
    pub status: FraudStatus,
    pub reason: Option<String>,
}

impl FraudResolutionRequest {
    pub fn new(entry: EntryId, status: FraudStatus) -> Self {
        FraudResolutionRequest {
            entry,
            status,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
