//! Transfer processing engine
//!
//! This module provides the `TransferEngine`, which orchestrates a transfer
//! end to end by coordinating the user directory, the account store, the risk
//! policy and the ledger.
//!
//! The engine enforces business rules such as:
//! - PIN verification before anything else is looked at
//! - Recipient resolution by identifier priority, no self-transfers
//! - Positive amounts and sufficient balance
//! - Debit always, credit only when the risk policy clears the transfer
//!
//! Everything from account selection to the ledger write runs inside a single
//! `AccountStore::transaction`, so a failure at any of those steps (including
//! the ledger write) leaves balances exactly as they were.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::core::account_store::AccountStore;
use crate::core::pin::FormatPinCheck;
use crate::core::risk::ThresholdPolicy;
use crate::core::traits::{LedgerStore, PinVerifier, RiskPolicy, UserDirectory};
use crate::types::{
    Account, Direction, EntryKind, FraudStatus, LedgerEntry, NewLedgerEntry, TransferError,
    TransferId, TransferRequest, User, UserId,
};

/// Description recorded on simulated external credits
pub const DEMO_CREDIT_DESCRIPTION: &str = "Demo Credit";

/// Category recorded on simulated external credits
pub const DEMO_CREDIT_CATEGORY: &str = "Income";

/// Transfer processing engine
///
/// Cloning is cheap: every collaborator is shared behind an `Arc`.
#[derive(Clone)]
pub struct TransferEngine {
    accounts: Arc<AccountStore>,
    directory: Arc<dyn UserDirectory>,
    ledger: Arc<dyn LedgerStore>,
    risk: Arc<dyn RiskPolicy>,
    pin: Arc<dyn PinVerifier>,
    config: EngineConfig,
}

impl TransferEngine {
    /// Create a new TransferEngine
    ///
    /// The risk policy defaults to a `ThresholdPolicy` at the configured
    /// fraud threshold and the PIN verifier to a four-character format check.
    ///
    /// # Arguments
    ///
    /// * `accounts` - Shared account store
    /// * `directory` - Directory used to resolve recipients
    /// * `ledger` - Ledger the legs are recorded in
    /// * `config` - Engine policy
    pub fn new(
        accounts: Arc<AccountStore>,
        directory: Arc<dyn UserDirectory>,
        ledger: Arc<dyn LedgerStore>,
        config: EngineConfig,
    ) -> Self {
        TransferEngine {
            accounts,
            directory,
            ledger,
            risk: Arc::new(ThresholdPolicy::new(config.fraud_threshold)),
            pin: Arc::new(FormatPinCheck::default()),
            config,
        }
    }

    pub fn with_risk_policy(mut self, policy: Arc<dyn RiskPolicy>) -> Self {
        self.risk = policy;
        self
    }

    pub fn with_pin_verifier(mut self, verifier: Arc<dyn PinVerifier>) -> Self {
        self.pin = verifier;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Move money from `sender` to the user named by `request.recipient`
    ///
    /// # Arguments
    ///
    /// * `sender` - The authenticated sending user
    /// * `request` - Recipient identifier, amount, PIN and descriptive fields
    ///
    /// # Returns
    ///
    /// * `Ok(LedgerEntry)` - the sender's leg of the recorded transfer
    /// * `Err(TransferError)` - nothing was changed
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The PIN is rejected (`InvalidPin`)
    /// - No user matches the identifier (`RecipientNotFound`)
    /// - The recipient is the sender (`SelfTransfer`)
    /// - The amount is not positive (`InvalidAmount`)
    /// - The preferred sender account is not an active account of the sender
    ///   (`AccountNotFound`)
    /// - The sender account cannot cover the amount (`InsufficientBalance`)
    /// - The ledger write fails (`StorageFailure`)
    pub fn transfer(
        &self,
        sender: &User,
        request: &TransferRequest,
    ) -> Result<LedgerEntry, TransferError> {
        if !self.pin.verify(sender, &request.pin) {
            return Err(TransferError::InvalidPin);
        }

        let recipient = self.directory.resolve(&request.recipient)?;
        if recipient.id == sender.id {
            return Err(TransferError::self_transfer(sender.id));
        }

        let amount = request.amount;
        if amount <= Decimal::ZERO {
            return Err(TransferError::invalid_amount(amount));
        }

        let category = request
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(self.config.default_category.as_str())
            .to_string();

        let (sent, _received) = self.accounts.transaction(&[sender.id, recipient.id], |txn| {
            let from = match request.sender_account {
                Some(preferred) => txn
                    .account(sender.id, preferred)?
                    .ok_or_else(|| TransferError::account_not_found(sender.id))?,
                None => txn.ensure_account(sender, self.config.starter_balance)?,
            };
            let to = txn.ensure_account(&recipient, Decimal::ZERO)?;

            if from.balance < amount {
                return Err(TransferError::insufficient_balance(from.id, from.balance, amount));
            }

            txn.apply_delta(sender.id, from.id, -amount)?;

            let assessment = self.risk.evaluate(amount, sender, &recipient);
            if assessment.status == FraudStatus::None {
                txn.apply_delta(recipient.id, to.id, amount)?;
            }

            let transfer_id = TransferId::generate();
            let sent = NewLedgerEntry {
                transfer_id: transfer_id.clone(),
                owner: sender.id,
                owner_name: sender.name.clone(),
                counterparty: Some(recipient.id),
                counterparty_name: Some(recipient.name.clone()),
                account: from.id,
                amount,
                direction: Direction::Sent,
                kind: EntryKind::Transfer,
                description: request.description.clone(),
                category: category.clone(),
                fraud_status: assessment.status,
                flagged_reason: assessment.reason,
            };
            let received = NewLedgerEntry {
                transfer_id,
                owner: recipient.id,
                owner_name: recipient.name.clone(),
                counterparty: Some(sender.id),
                counterparty_name: Some(sender.name.clone()),
                account: to.id,
                amount,
                direction: Direction::Received,
                kind: EntryKind::Transfer,
                description: request.description.clone(),
                category: category.clone(),
                fraud_status: FraudStatus::None,
                flagged_reason: None,
            };

            self.ledger.append_pair(sent, received)
        })?;

        if sent.fraud_status.is_held() {
            warn!(
                transfer_id = %sent.transfer_id,
                entry = sent.id,
                sender = sender.id,
                recipient = recipient.id,
                amount = %amount,
                reason = sent.flagged_reason.as_deref().unwrap_or(""),
                "transfer held for review"
            );
        } else {
            info!(
                transfer_id = %sent.transfer_id,
                entry = sent.id,
                sender = sender.id,
                recipient = recipient.id,
                amount = %amount,
                "transfer completed"
            );
        }

        Ok(sent)
    }

    /// Credit a user's account from outside the system
    ///
    /// Provisions the account at zero if the user has none and records a
    /// single `received` entry with no counterparty.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if the amount is not positive.
    pub fn simulate_credit(&self, user: &User, amount: Decimal) -> Result<LedgerEntry, TransferError> {
        if amount <= Decimal::ZERO {
            return Err(TransferError::invalid_amount(amount));
        }

        let entry = self.accounts.transaction(&[user.id], |txn| {
            let account = txn.ensure_account(user, Decimal::ZERO)?;
            txn.apply_delta(user.id, account.id, amount)?;

            self.ledger.append(NewLedgerEntry {
                transfer_id: TransferId::generate(),
                owner: user.id,
                owner_name: user.name.clone(),
                counterparty: None,
                counterparty_name: None,
                account: account.id,
                amount,
                direction: Direction::Received,
                kind: EntryKind::Credit,
                description: DEMO_CREDIT_DESCRIPTION.to_string(),
                category: DEMO_CREDIT_CATEGORY.to_string(),
                fraud_status: FraudStatus::None,
                flagged_reason: None,
            })
        })?;

        debug!(user = user.id, entry = entry.id, amount = %amount, "external credit applied");
        Ok(entry)
    }

    /// The user's active accounts, provisioning one with the starter balance
    /// if they have none
    pub fn accounts_of(&self, user: &User) -> Result<Vec<Account>, TransferError> {
        self.accounts
            .ensure_account(user, self.config.starter_balance)?;
        Ok(self.accounts.accounts_of(user.id))
    }

    /// Every ledger entry owned by the user, newest first
    pub fn history(&self, user: UserId) -> Vec<LedgerEntry> {
        self.ledger.entries_for(user)
    }
}
