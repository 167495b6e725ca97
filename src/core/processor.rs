//! Replay command dispatch
//!
//! This module provides the `CommandProcessor`, which routes each
//! `ReplayCommand` to the engine or admin service that handles it and keeps
//! the journal's transfer labels so later `resolve` commands can name a
//! transfer by label instead of by entry id.

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::core::bank::BankCore;
use crate::core::fraud_resolution::ResolutionOutcome;
use crate::types::{
    EntryId, EntryRef, FraudResolutionRequest, FraudStatus, LedgerEntry, ReplayCommand,
    ResolutionResponse, TransferError, TransferRequest, TransferResponse, UserId, UserStatus,
};

/// What a successfully processed command did
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Credited(LedgerEntry),
    Transferred(LedgerEntry),
    Resolved(ResolutionOutcome),
    StatusUpdated { user: UserId, previous: UserStatus },
}

/// Counts of a replay run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Commands that were applied
    pub applied: usize,
    /// Commands the core rejected
    pub rejected: usize,
    /// Rows that could not be parsed into a command
    pub malformed: usize,
}

impl ReplayStats {
    pub fn record(&mut self, result: &Result<CommandOutcome, TransferError>) {
        match result {
            Ok(_) => self.applied += 1,
            Err(_) => self.rejected += 1,
        }
    }

    pub fn merge(&mut self, other: ReplayStats) {
        self.applied += other.applied;
        self.rejected += other.rejected;
        self.malformed += other.malformed;
    }

    pub fn total(&self) -> usize {
        self.applied + self.rejected + self.malformed
    }
}

/// Routes replay commands into a `BankCore`
///
/// Cloning shares the bank and the label table.
#[derive(Clone)]
pub struct CommandProcessor {
    bank: BankCore,
    labels: Arc<DashMap<String, EntryId>>,
}

impl CommandProcessor {
    pub fn new(bank: BankCore) -> Self {
        Self {
            bank,
            labels: Arc::new(DashMap::new()),
        }
    }

    pub fn bank(&self) -> &BankCore {
        &self.bank
    }

    /// Process a single replay command
    ///
    /// # Arguments
    ///
    /// * `command` - The command to apply
    ///
    /// # Returns
    ///
    /// * `Ok(CommandOutcome)` if the command was applied
    /// * `Err(TransferError)` if the core rejected it; nothing was changed
    ///
    /// # Errors
    ///
    /// `UserNotFound` if the acting user is unknown, `UnknownReference` if a
    /// resolve names a label no transfer produced, plus whatever the
    /// underlying operation returns.
    pub fn process(&self, command: ReplayCommand) -> Result<CommandOutcome, TransferError> {
        let kind = command.kind();
        let actor = command.actor();

        let result = match command {
            ReplayCommand::Credit { actor, amount } => self.process_credit(actor, amount),
            ReplayCommand::Transfer {
                actor,
                request,
                label,
            } => self.process_transfer(actor, &request, label),
            ReplayCommand::Resolve {
                actor,
                target,
                status,
                reason,
            } => self.process_resolve(actor, target, status, reason),
            ReplayCommand::UserStatus {
                actor,
                target,
                status,
                reason,
            } => self.process_user_status(actor, target, status, reason),
        };

        log_result(kind, actor, &result);
        result
    }

    fn process_credit(&self, actor: UserId, amount: Decimal) -> Result<CommandOutcome, TransferError> {
        let user = self.bank.user(actor)?;
        self.bank
            .engine()
            .simulate_credit(&user, amount)
            .map(CommandOutcome::Credited)
    }

    fn process_transfer(
        &self,
        actor: UserId,
        request: &TransferRequest,
        label: Option<String>,
    ) -> Result<CommandOutcome, TransferError> {
        let sender = self.bank.user(actor)?;
        let sent = self.bank.engine().transfer(&sender, request)?;

        if let Some(label) = label {
            if let Some(previous) = self.labels.insert(label.clone(), sent.id) {
                warn!(label = %label, previous, current = sent.id, "transfer label reused");
            }
        }

        Ok(CommandOutcome::Transferred(sent))
    }

    fn process_resolve(
        &self,
        actor: UserId,
        target: EntryRef,
        status: FraudStatus,
        reason: Option<String>,
    ) -> Result<CommandOutcome, TransferError> {
        let admin = self.bank.user(actor)?;
        let entry = self.entry_id(&target)?;

        let request = FraudResolutionRequest {
            entry,
            status,
            reason,
        };
        self.bank
            .fraud_resolution()
            .resolve(&admin, &request)
            .map(CommandOutcome::Resolved)
    }

    fn process_user_status(
        &self,
        actor: UserId,
        target: UserId,
        status: UserStatus,
        reason: Option<String>,
    ) -> Result<CommandOutcome, TransferError> {
        let admin = self.bank.user(actor)?;
        let previous = self
            .bank
            .user_status()
            .update_user_status(&admin, target, status, reason)?;
        Ok(CommandOutcome::StatusUpdated {
            user: target,
            previous,
        })
    }

    /// Resolve a label or raw id to a ledger entry id
    pub fn entry_id(&self, target: &EntryRef) -> Result<EntryId, TransferError> {
        match target {
            EntryRef::Id(id) => Ok(*id),
            EntryRef::Label(label) => self
                .labels
                .get(label)
                .map(|entry| *entry.value())
                .ok_or_else(|| TransferError::unknown_reference(label)),
        }
    }
}

/// Log a command result as the response a transport layer would return
fn log_result(kind: &'static str, actor: UserId, result: &Result<CommandOutcome, TransferError>) {
    let (success, http_status, code, message) = match result {
        Ok(CommandOutcome::Credited(entry)) | Ok(CommandOutcome::Transferred(entry)) => {
            let response = TransferResponse::from(Ok(entry.clone()));
            let message = response
                .transaction
                .map(|view| format!("{} {} to {}", view.transaction_type, view.amount, view.recipient_name))
                .unwrap_or_default();
            (response.success, response.http_status, response.code, message)
        }
        Ok(CommandOutcome::Resolved(outcome)) => {
            let response = ResolutionResponse::from(Ok::<_, TransferError>(outcome));
            (response.success, response.http_status, response.code, response.message)
        }
        Ok(CommandOutcome::StatusUpdated { user, .. }) => {
            (true, 200, None, format!("status of user {} updated", user))
        }
        Err(e) if kind == "resolve" => {
            let response = ResolutionResponse::from(Err::<(), _>(e.clone()));
            (response.success, response.http_status, response.code, response.message)
        }
        Err(e) => {
            let response = TransferResponse::from(Err(e.clone()));
            (
                response.success,
                response.http_status,
                response.code,
                response.error.unwrap_or_default(),
            )
        }
    };

    if success {
        debug!(command = kind, actor, http_status, "{}", message);
    } else {
        warn!(
            command = kind,
            actor,
            code = code.unwrap_or_default(),
            http_status,
            "command rejected: {}",
            message
        );
    }
}
