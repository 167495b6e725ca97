//! Composition root
//!
//! `BankCore` wires the in-memory stores into the transfer engine and the two
//! admin services so they all share one account store, one ledger and one
//! audit log.
//!
//! ```text
//! BankCore
//!     ├── Arc<AccountStore>
//!     ├── Arc<InMemoryDirectory>  (UserDirectory)
//!     ├── Arc<InMemoryLedger>     (LedgerStore)
//!     ├── Arc<InMemoryAuditLog>   (AuditSink)
//!     ├── TransferEngine
//!     ├── FraudResolutionService
//!     └── UserStatusService
//! ```

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::core::account_store::AccountStore;
use crate::core::audit::InMemoryAuditLog;
use crate::core::engine::TransferEngine;
use crate::core::fraud_resolution::FraudResolutionService;
use crate::core::identity::InMemoryDirectory;
use crate::core::ledger::InMemoryLedger;
use crate::core::traits::UserDirectory;
use crate::core::user_admin::UserStatusService;
use crate::types::{TransferError, User, UserId};

/// Fully wired in-memory bank
///
/// Cloning shares all state.
#[derive(Clone)]
pub struct BankCore {
    accounts: Arc<AccountStore>,
    directory: Arc<InMemoryDirectory>,
    ledger: Arc<InMemoryLedger>,
    audit: Arc<InMemoryAuditLog>,
    engine: TransferEngine,
    fraud_resolution: FraudResolutionService,
    user_status: UserStatusService,
}

impl BankCore {
    /// Build a bank with the given users registered
    ///
    /// # Errors
    ///
    /// `DuplicateIdentifier` if two users share an identifier.
    pub fn new(
        config: EngineConfig,
        users: impl IntoIterator<Item = User>,
    ) -> Result<Self, TransferError> {
        let accounts = Arc::new(AccountStore::from_config(&config));
        let directory = Arc::new(InMemoryDirectory::with_users(users)?);
        let ledger = Arc::new(InMemoryLedger::new());
        let audit = Arc::new(InMemoryAuditLog::new());

        let engine = TransferEngine::new(
            Arc::clone(&accounts),
            directory.clone(),
            ledger.clone(),
            config,
        );
        let fraud_resolution =
            FraudResolutionService::new(Arc::clone(&accounts), ledger.clone(), audit.clone());
        let user_status = UserStatusService::new(directory.clone(), audit.clone());

        Ok(Self {
            accounts,
            directory,
            ledger,
            audit,
            engine,
            fraud_resolution,
            user_status,
        })
    }

    pub fn engine(&self) -> &TransferEngine {
        &self.engine
    }

    pub fn fraud_resolution(&self) -> &FraudResolutionService {
        &self.fraud_resolution
    }

    pub fn user_status(&self) -> &UserStatusService {
        &self.user_status
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn directory(&self) -> &InMemoryDirectory {
        &self.directory
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    pub fn audit(&self) -> &InMemoryAuditLog {
        &self.audit
    }

    /// Look up a registered user
    pub fn user(&self, id: UserId) -> Result<User, TransferError> {
        self.directory
            .get(id)
            .ok_or_else(|| TransferError::user_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::LedgerStore;
    use crate::types::TransferRequest;
    use rust_decimal::Decimal;

    #[test]
    fn test_components_share_state() {
        let bank = BankCore::new(
            EngineConfig::default(),
            [
                User::new(1, "Asha"),
                User::new(2, "Ravi").with_email("ravi@neo.bank"),
            ],
        )
        .unwrap();
        let clone = bank.clone();

        let asha = bank.user(1).unwrap();
        bank.engine()
            .transfer(&asha, &TransferRequest::new("ravi@neo.bank", Decimal::ONE, "1234"))
            .unwrap();

        assert_eq!(clone.ledger().all().len(), 2);
        assert_eq!(clone.accounts().all_accounts().len(), 2);
        assert_eq!(bank.user(3).unwrap_err(), TransferError::user_not_found(3));
    }

    #[test]
    fn test_duplicate_identifiers_rejected() {
        let result = BankCore::new(
            EngineConfig::default(),
            [
                User::new(1, "Asha").with_email("same@neo.bank"),
                User::new(2, "Ravi").with_mobile_number("same@neo.bank"),
            ],
        );
        assert_eq!(result.err().map(|e| e.code()), Some("DUPLICATE_IDENTIFIER"));
    }
}
