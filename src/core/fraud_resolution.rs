//! Fraud resolution service
//!
//! Settles held transfers on an administrator's decision:
//!
//! ```text
//! PENDING ──APPROVED──► credit the recipient with the held amount
//!         └─BLOCKED───► refund the sender (reverse the original debit)
//! ```
//!
//! Only `APPROVED` and `BLOCKED` are accepted as decisions, so a settled entry
//! can never be re-opened to `PENDING`. A decision on an entry that is not
//! held only rewrites the status field and never moves money, so a second
//! decision on an already settled entry cannot credit twice.
//!
//! Resolutions are serialized through a service-wide lock. The status read,
//! the balance effect and the status write therefore observe each other even
//! when two admins act on the same entry at once. The balance effect and the
//! status write commit together inside one account unit of work.

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::core::account_store::{AccountStore, AccountTxn};
use crate::core::traits::{AuditSink, LedgerStore};
use crate::types::{
    AccountId, Actor, AuditAction, AuditRecord, Direction, EntryId, FraudResolutionRequest,
    FraudStatus, LedgerEntry, TargetKind, TransferError, User, UserId,
};

/// Money movement a resolution caused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Held funds credited to the recipient
    Released { owner: UserId, account: AccountId },
    /// Held funds returned to the sender
    Refunded { owner: UserId, account: AccountId },
    /// Status-only change
    NoBalanceEffect,
}

/// Result of a successful resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOutcome {
    pub entry: EntryId,
    pub previous: FraudStatus,
    pub current: FraudStatus,
    pub settlement: Settlement,
}

/// Admin-facing service that settles held transfers
#[derive(Clone)]
pub struct FraudResolutionService {
    accounts: Arc<AccountStore>,
    ledger: Arc<dyn LedgerStore>,
    audit: Arc<dyn AuditSink>,
    resolution_lock: Arc<Mutex<()>>,
}

impl FraudResolutionService {
    pub fn new(
        accounts: Arc<AccountStore>,
        ledger: Arc<dyn LedgerStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            accounts,
            ledger,
            audit,
            resolution_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Apply an administrator's decision to a ledger entry
    ///
    /// # Arguments
    ///
    /// * `admin` - The acting administrator
    /// * `request` - Target entry, new status and the admin's reason
    ///
    /// # Returns
    ///
    /// The previous and new status and the money movement, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The acting user is not an admin (`Forbidden`)
    /// - The new status is not `APPROVED` or `BLOCKED` (`InvalidStatus`)
    /// - The entry does not exist (`TransactionNotFound`)
    /// - The party to be credited has no active account (`AccountNotFound`)
    ///
    /// On error nothing changes and nothing is audited.
    pub fn resolve(
        &self,
        admin: &User,
        request: &FraudResolutionRequest,
    ) -> Result<ResolutionOutcome, TransferError> {
        if !admin.is_admin() {
            return Err(TransferError::forbidden(admin.id, "resolve transaction fraud status"));
        }
        if !request.status.is_decision() {
            return Err(TransferError::invalid_status(request.status.as_str()));
        }

        let _serialized = self
            .resolution_lock
            .lock()
            .map_err(|_| TransferError::storage_failure("fraud resolution lock is poisoned"))?;

        let entry = self
            .ledger
            .get(request.entry)
            .ok_or_else(|| TransferError::transaction_not_found(request.entry))?;
        let previous = entry.fraud_status;
        let current = request.status;

        let settlement = match (previous, current) {
            (FraudStatus::Pending, FraudStatus::Approved) => match payee(&entry) {
                Some(owner) => self.settle(&entry, owner, current, Settlement::released)?,
                None => self.status_only(&entry, current, "entry has no recipient")?,
            },
            (FraudStatus::Pending, FraudStatus::Blocked) => match payer(&entry) {
                Some(owner) => self.settle(&entry, owner, current, Settlement::refunded)?,
                None => self.status_only(&entry, current, "entry has no sender")?,
            },
            _ => self.status_only(&entry, current, "not a settlement transition")?,
        };

        self.audit.record(AuditRecord {
            actor: Actor::from(admin),
            action: AuditAction::UpdateTransactionFraudStatus,
            target_kind: TargetKind::Transaction,
            target_id: entry.id,
            reason: request.reason.clone(),
            details: format!("Status changed from {} to {}", previous, current),
        });

        info!(
            entry = entry.id,
            transfer_id = %entry.transfer_id,
            admin = admin.id,
            previous = %previous,
            current = %current,
            settlement = ?settlement,
            "fraud status updated"
        );

        Ok(ResolutionOutcome {
            entry: entry.id,
            previous,
            current,
            settlement,
        })
    }

    /// Credit `owner` with the entry amount and write the new status as one
    /// unit of work
    fn settle(
        &self,
        entry: &LedgerEntry,
        owner: UserId,
        status: FraudStatus,
        settlement: fn(UserId, AccountId) -> Settlement,
    ) -> Result<Settlement, TransferError> {
        let preferred = self.leg_account(entry, owner);

        self.accounts.transaction(&[owner], |txn| {
            let account = settlement_account(txn, owner, preferred)?;
            txn.apply_delta(owner, account, entry.amount)?;
            self.ledger.set_fraud_status(entry.id, status, None)?;
            Ok(settlement(owner, account))
        })
    }

    fn status_only(
        &self,
        entry: &LedgerEntry,
        status: FraudStatus,
        why: &str,
    ) -> Result<Settlement, TransferError> {
        warn!(
            entry = entry.id,
            previous = %entry.fraud_status,
            current = %status,
            why,
            "fraud status changed without balance effect"
        );
        self.ledger.set_fraud_status(entry.id, status, None)?;
        Ok(Settlement::NoBalanceEffect)
    }

    /// The account `owner`'s own leg of this transfer moved through
    fn leg_account(&self, entry: &LedgerEntry, owner: UserId) -> Option<AccountId> {
        if entry.owner == owner {
            return Some(entry.account);
        }
        self.ledger
            .legs(&entry.transfer_id)
            .into_iter()
            .find(|leg| leg.owner == owner)
            .map(|leg| leg.account)
    }
}

impl Settlement {
    fn released(owner: UserId, account: AccountId) -> Self {
        Settlement::Released { owner, account }
    }

    fn refunded(owner: UserId, account: AccountId) -> Self {
        Settlement::Refunded { owner, account }
    }
}

/// The transfer's own account if still active, else the owner's first active
/// account
fn settlement_account(
    txn: &AccountTxn<'_>,
    owner: UserId,
    preferred: Option<AccountId>,
) -> Result<AccountId, TransferError> {
    if let Some(id) = preferred {
        if let Some(account) = txn.account(owner, id)? {
            return Ok(account.id);
        }
    }
    txn.first_active(owner)?
        .map(|account| account.id)
        .ok_or_else(|| TransferError::account_not_found(owner))
}

/// The party that paid
fn payer(entry: &LedgerEntry) -> Option<UserId> {
    match entry.direction {
        Direction::Sent => Some(entry.owner),
        Direction::Received => entry.counterparty,
    }
}

/// The party that is owed the amount
fn payee(entry: &LedgerEntry) -> Option<UserId> {
    match entry.direction {
        Direction::Sent => entry.counterparty,
        Direction::Received => Some(entry.owner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::core::audit::InMemoryAuditLog;
    use crate::core::engine::TransferEngine;
    use crate::core::identity::InMemoryDirectory;
    use crate::core::ledger::InMemoryLedger;
    use crate::types::{Role, TransferRequest};
    use rstest::{fixture, rstest};
    use rust_decimal::Decimal;

    struct Harness {
        engine: TransferEngine,
        service: FraudResolutionService,
        accounts: Arc<AccountStore>,
        ledger: Arc<InMemoryLedger>,
        audit: Arc<InMemoryAuditLog>,
        asha: User,
        admin: User,
    }

    impl Harness {
        fn balance(&self, owner: UserId) -> Decimal {
            self.accounts
                .first_active_account(owner)
                .map(|a| a.balance)
                .unwrap_or_default()
        }

        fn send(&self, amount: i64) -> LedgerEntry {
            self.engine
                .transfer(
                    &self.asha,
                    &TransferRequest::new("ravi", Decimal::new(amount, 0), "0000"),
                )
                .unwrap()
        }
    }

    #[fixture]
    fn harness() -> Harness {
        let asha = User::new(1, "Asha").with_email("asha@neo.bank");
        let ravi = User::new(2, "Ravi").with_public_handle("ravi");
        let admin = User::new(9, "Ops")
            .with_email("ops@neo.bank")
            .with_role(Role::Admin);
        let directory = Arc::new(
            InMemoryDirectory::with_users([asha.clone(), ravi, admin.clone()]).unwrap(),
        );
        let accounts = Arc::new(AccountStore::default());
        let ledger = Arc::new(InMemoryLedger::new());
        let audit = Arc::new(InMemoryAuditLog::new());
        let engine = TransferEngine::new(
            Arc::clone(&accounts),
            directory,
            ledger.clone(),
            EngineConfig::default(),
        );
        let service = FraudResolutionService::new(Arc::clone(&accounts), ledger.clone(), audit.clone());
        Harness {
            engine,
            service,
            accounts,
            ledger,
            audit,
            asha,
            admin,
        }
    }

    fn decide(entry: EntryId, status: FraudStatus) -> FraudResolutionRequest {
        FraudResolutionRequest::new(entry, status).with_reason("reviewed")
    }

    #[rstest]
    fn test_approve_releases_to_recipient(harness: Harness) {
        let held = harness.send(6000);

        let outcome = harness
            .service
            .resolve(&harness.admin, &decide(held.id, FraudStatus::Approved))
            .unwrap();

        assert_eq!(outcome.previous, FraudStatus::Pending);
        assert!(matches!(outcome.settlement, Settlement::Released { owner: 2, .. }));
        assert_eq!(harness.balance(1), Decimal::new(4000, 0));
        assert_eq!(harness.balance(2), Decimal::new(6000, 0));
        assert_eq!(
            harness.ledger.get(held.id).unwrap().fraud_status,
            FraudStatus::Approved
        );
    }

    #[rstest]
    fn test_block_refunds_sender(harness: Harness) {
        let held = harness.send(6000);

        let outcome = harness
            .service
            .resolve(&harness.admin, &decide(held.id, FraudStatus::Blocked))
            .unwrap();

        assert!(matches!(outcome.settlement, Settlement::Refunded { owner: 1, .. }));
        assert_eq!(harness.balance(1), Decimal::new(10000, 0));
        assert_eq!(harness.balance(2), Decimal::ZERO);
    }

    #[rstest]
    #[case::approve_twice(FraudStatus::Approved, FraudStatus::Approved)]
    #[case::block_after_approve(FraudStatus::Approved, FraudStatus::Blocked)]
    #[case::approve_after_block(FraudStatus::Blocked, FraudStatus::Approved)]
    fn test_second_decision_moves_no_money(
        harness: Harness,
        #[case] first: FraudStatus,
        #[case] second: FraudStatus,
    ) {
        let held = harness.send(6000);
        harness.service.resolve(&harness.admin, &decide(held.id, first)).unwrap();
        let total = harness.accounts.total_balance();
        let (sender, recipient) = (harness.balance(1), harness.balance(2));

        let outcome = harness
            .service
            .resolve(&harness.admin, &decide(held.id, second))
            .unwrap();

        assert_eq!(outcome.settlement, Settlement::NoBalanceEffect);
        assert_eq!(outcome.previous, first);
        assert_eq!(harness.accounts.total_balance(), total);
        assert_eq!(harness.balance(1), sender);
        assert_eq!(harness.balance(2), recipient);
        assert_eq!(harness.ledger.get(held.id).unwrap().fraud_status, second);
    }

    #[rstest]
    #[case::approved(FraudStatus::Approved, FraudStatus::Pending)]
    #[case::blocked(FraudStatus::Blocked, FraudStatus::Pending)]
    #[case::approved_to_none(FraudStatus::Approved, FraudStatus::None)]
    fn test_decided_entry_cannot_be_reopened(
        harness: Harness,
        #[case] first: FraudStatus,
        #[case] reopen: FraudStatus,
    ) {
        let held = harness.send(6000);
        harness.service.resolve(&harness.admin, &decide(held.id, first)).unwrap();

        let err = harness
            .service
            .resolve(&harness.admin, &decide(held.id, reopen))
            .unwrap_err();
        assert_eq!(err, TransferError::invalid_status(reopen.as_str()));
        assert_eq!(err.http_status(), 400);
        assert_eq!(harness.ledger.get(held.id).unwrap().fraud_status, first);

        // the opposite decision afterwards is status-only
        let opposite = if first == FraudStatus::Approved {
            FraudStatus::Blocked
        } else {
            FraudStatus::Approved
        };
        let outcome = harness
            .service
            .resolve(&harness.admin, &decide(held.id, opposite))
            .unwrap();

        assert_eq!(outcome.settlement, Settlement::NoBalanceEffect);
        assert_eq!(harness.accounts.total_balance(), Decimal::new(10000, 0));
        assert_eq!(harness.audit.entries().len(), 2);
    }

    #[rstest]
    fn test_non_pending_entry_moves_no_money(harness: Harness) {
        let settled = harness.send(100);

        let outcome = harness
            .service
            .resolve(&harness.admin, &decide(settled.id, FraudStatus::Blocked))
            .unwrap();

        assert_eq!(outcome.settlement, Settlement::NoBalanceEffect);
        assert_eq!(harness.balance(1), Decimal::new(9900, 0));
        assert_eq!(harness.balance(2), Decimal::new(100, 0));
    }

    #[rstest]
    fn test_resolution_is_audited(harness: Harness) {
        let held = harness.send(6000);

        harness
            .service
            .resolve(&harness.admin, &decide(held.id, FraudStatus::Blocked))
            .unwrap();

        let entries = harness.audit.entries();
        assert_eq!(entries.len(), 1);
        let audit = &entries[0];
        assert_eq!(audit.actor.id, 9);
        assert_eq!(audit.actor.email.as_deref(), Some("ops@neo.bank"));
        assert_eq!(audit.action, AuditAction::UpdateTransactionFraudStatus);
        assert_eq!(audit.target_kind, TargetKind::Transaction);
        assert_eq!(audit.target_id, held.id);
        assert_eq!(audit.reason.as_deref(), Some("reviewed"));
        assert_eq!(audit.details, "Status changed from PENDING to BLOCKED");
    }

    #[rstest]
    fn test_unknown_entry(harness: Harness) {
        let err = harness
            .service
            .resolve(&harness.admin, &decide(404, FraudStatus::Approved))
            .unwrap_err();

        assert_eq!(err, TransferError::transaction_not_found(404));
        assert!(harness.audit.entries().is_empty());
    }

    #[rstest]
    fn test_non_admin_is_forbidden(harness: Harness) {
        let held = harness.send(6000);

        let err = harness
            .service
            .resolve(&harness.asha, &decide(held.id, FraudStatus::Approved))
            .unwrap_err();

        assert_eq!(err.code(), "FORBIDDEN");
        assert_eq!(harness.ledger.get(held.id).unwrap().fraud_status, FraudStatus::Pending);
    }

    #[rstest]
    fn test_missing_active_account_fails_without_change(harness: Harness) {
        let held = harness.send(6000);
        let recipient_account = harness.accounts.first_active_account(2).unwrap();
        harness.accounts.deactivate(2, recipient_account.id).unwrap();

        let err = harness
            .service
            .resolve(&harness.admin, &decide(held.id, FraudStatus::Approved))
            .unwrap_err();

        assert_eq!(err, TransferError::account_not_found(2));
        assert_eq!(harness.ledger.get(held.id).unwrap().fraud_status, FraudStatus::Pending);
        assert!(harness.audit.entries().is_empty());
    }

    #[rstest]
    fn test_refund_falls_back_to_first_active_account(harness: Harness) {
        let held = harness.send(6000);
        harness.accounts.deactivate(1, held.account).unwrap();
        let replacement = harness.accounts.ensure_account(&harness.asha, Decimal::ZERO).unwrap();

        let outcome = harness
            .service
            .resolve(&harness.admin, &decide(held.id, FraudStatus::Blocked))
            .unwrap();

        assert_eq!(
            outcome.settlement,
            Settlement::Refunded { owner: 1, account: replacement.id }
        );
        assert_eq!(harness.balance(1), Decimal::new(6000, 0));
    }
}
