//! Thread-safe account storage with atomic multi-account units of work
//!
//! This module provides the `AccountStore`, which owns every account balance
//! and is the only place balances change.
//!
//! # Design
//!
//! Accounts are grouped into one `AccountBook` per owner. Each book sits behind
//! its own mutex, and the books are indexed by a `DashMap` so unrelated owners
//! never contend on a shared lock.
//!
//! A unit of work (`AccountStore::transaction`) locks every book it needs up
//! front, in ascending owner order, and snapshots them. The closure then runs
//! against the locked books. If it returns an error every book is restored from
//! its snapshot before the locks are released, so a failed unit of work leaves
//! no partial balance change and no half-provisioned account behind.
//!
//! # Thread Safety
//!
//! - Two units of work touching the same owner serialize on that owner's book,
//!   so a check-then-debit can never read a stale balance.
//! - Locks are always taken in ascending owner order, so two transfers in
//!   opposite directions cannot deadlock.
//! - Find-or-create happens under the owner's lock: concurrent first transfers
//!   for the same user provision exactly one account.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::EngineConfig;
use crate::types::{Account, AccountId, TransferError, User, UserId};

/// All accounts of a single owner, in provisioning order
#[derive(Debug, Clone, Default)]
struct AccountBook {
    accounts: Vec<Account>,
}

impl AccountBook {
    fn first_active(&self) -> Option<&Account> {
        self.accounts.iter().find(|a| a.active)
    }

    fn active(&self, id: AccountId) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id && a.active)
    }

    fn active_mut(&mut self, id: AccountId) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.id == id && a.active)
    }
}

type SharedBook = Arc<Mutex<AccountBook>>;

/// Concurrent account store
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
#[derive(Debug)]
pub struct AccountStore {
    books: DashMap<UserId, SharedBook>,
    next_id: AtomicU64,
    bank_name: String,
    number_prefix: String,
}

impl AccountStore {
    /// Create an empty store
    ///
    /// # Arguments
    ///
    /// * `bank_name` - Institution name stamped on provisioned accounts
    /// * `number_prefix` - Prefix of generated account numbers
    pub fn new(bank_name: impl Into<String>, number_prefix: impl Into<String>) -> Self {
        Self {
            books: DashMap::new(),
            next_id: AtomicU64::new(1),
            bank_name: bank_name.into(),
            number_prefix: number_prefix.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.bank_name, &config.account_number_prefix)
    }

    /// Handle to an owner's book, creating an empty one on first use
    ///
    /// The `DashMap` shard guard is released before the handle is returned, so
    /// callers never hold a shard lock while waiting on a book.
    fn book(&self, owner: UserId) -> SharedBook {
        Arc::clone(self.books.entry(owner).or_insert_with(SharedBook::default).value())
    }

    fn read<T>(&self, owner: UserId, f: impl FnOnce(&AccountBook) -> T) -> Option<T> {
        let handle = self.books.get(&owner).map(|entry| Arc::clone(entry.value()))?;
        let book = handle.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&book))
    }

    /// Run `f` as one atomic unit of work over the books of `owners`
    ///
    /// Duplicate owners are locked once. Only the listed owners' accounts can
    /// be read or changed through the `AccountTxn`.
    ///
    /// # Returns
    ///
    /// * `Ok(T)` if `f` succeeded; all changes are kept
    /// * `Err(TransferError)` if `f` failed; all changes are rolled back
    ///
    /// # Errors
    ///
    /// Whatever `f` returns, or `StorageFailure` if a book's lock is poisoned.
    pub fn transaction<T, F>(&self, owners: &[UserId], f: F) -> Result<T, TransferError>
    where
        F: FnOnce(&mut AccountTxn<'_>) -> Result<T, TransferError>,
    {
        let mut ids = owners.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let handles: Vec<(UserId, SharedBook)> =
            ids.into_iter().map(|id| (id, self.book(id))).collect();

        let mut guards = Vec::with_capacity(handles.len());
        for (owner, handle) in &handles {
            let guard = handle.lock().map_err(|_| {
                TransferError::storage_failure(format!("account book of user {} is poisoned", owner))
            })?;
            guards.push((*owner, guard));
        }

        let snapshots: Vec<AccountBook> = guards.iter().map(|(_, book)| (**book).clone()).collect();

        let mut txn = AccountTxn { store: self, books: guards };
        let result = f(&mut txn);

        if result.is_err() {
            for ((_, book), snapshot) in txn.books.iter_mut().zip(snapshots) {
                **book = snapshot;
            }
        }

        result
    }

    /// All active accounts of an owner, in provisioning order
    pub fn accounts_of(&self, owner: UserId) -> Vec<Account> {
        self.read(owner, |book| {
            book.accounts.iter().filter(|a| a.active).cloned().collect()
        })
        .unwrap_or_default()
    }

    /// The owner's first active account, without provisioning
    pub fn first_active_account(&self, owner: UserId) -> Option<Account> {
        self.read(owner, |book| book.first_active().cloned()).flatten()
    }

    /// Find-or-create the owner's first active account as one atomic step
    pub fn ensure_account(&self, owner: &User, opening_balance: Decimal) -> Result<Account, TransferError> {
        self.transaction(&[owner.id], |txn| txn.ensure_account(owner, opening_balance))
    }

    /// Atomically adjust one active account's balance
    pub fn apply_delta(
        &self,
        owner: UserId,
        account: AccountId,
        delta: Decimal,
    ) -> Result<Account, TransferError> {
        self.transaction(&[owner], |txn| txn.apply_delta(owner, account, delta))
    }

    /// Clear an account's active flag
    ///
    /// Deactivated accounts keep their balance but no longer take part in
    /// transfers or resolutions.
    pub fn deactivate(&self, owner: UserId, account: AccountId) -> Result<Account, TransferError> {
        self.transaction(&[owner], |txn| {
            let book = txn.book_mut(owner)?;
            let target = book
                .active_mut(account)
                .ok_or_else(|| TransferError::account_not_found(owner))?;
            target.active = false;
            Ok(target.clone())
        })
    }

    /// Every account, active or not, ordered by owner then account id
    pub fn all_accounts(&self) -> Vec<Account> {
        let handles: Vec<SharedBook> = self
            .books
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut accounts: Vec<Account> = handles
            .iter()
            .flat_map(|handle| {
                let book = handle.lock().unwrap_or_else(PoisonError::into_inner);
                book.accounts.clone()
            })
            .collect();
        accounts.sort_by_key(|a| (a.owner, a.id));
        accounts
    }

    /// Sum of every account balance
    pub fn total_balance(&self) -> Decimal {
        self.all_accounts().iter().map(|a| a.balance).sum()
    }

    fn generate_number(&self) -> String {
        let ulid = ulid::Ulid::new().to_string();
        format!("{}{}", self.number_prefix, &ulid[ulid.len() - 8..])
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Locked view of the books taking part in one unit of work
pub struct AccountTxn<'a> {
    store: &'a AccountStore,
    books: Vec<(UserId, MutexGuard<'a, AccountBook>)>,
}

impl AccountTxn<'_> {
    fn book(&self, owner: UserId) -> Result<&AccountBook, TransferError> {
        self.books
            .iter()
            .find(|(id, _)| *id == owner)
            .map(|(_, book)| &**book)
            .ok_or_else(|| not_enlisted(owner))
    }

    fn book_mut(&mut self, owner: UserId) -> Result<&mut AccountBook, TransferError> {
        self.books
            .iter_mut()
            .find(|(id, _)| *id == owner)
            .map(|(_, book)| &mut **book)
            .ok_or_else(|| not_enlisted(owner))
    }

    /// The owner's first active account, provisioning one if none exists
    ///
    /// A provisioned account takes the user's own account number when they
    /// have one, otherwise a generated number.
    ///
    /// # Arguments
    ///
    /// * `owner` - The user whose account is needed
    /// * `opening_balance` - Balance of the account if it has to be created
    pub fn ensure_account(
        &mut self,
        owner: &User,
        opening_balance: Decimal,
    ) -> Result<Account, TransferError> {
        let store = self.store;
        let book = self.book_mut(owner.id)?;
        if let Some(existing) = book.first_active() {
            return Ok(existing.clone());
        }

        let id = store.next_id.fetch_add(1, Ordering::Relaxed);
        let number = owner
            .account_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| store.generate_number());

        let account = Account::new(id, owner.id, number, &store.bank_name, opening_balance);
        debug!(
            owner = owner.id,
            account = id,
            number = %account.number,
            opening_balance = %opening_balance,
            "provisioned account"
        );
        book.accounts.push(account.clone());
        Ok(account)
    }

    pub fn first_active(&self, owner: UserId) -> Result<Option<Account>, TransferError> {
        Ok(self.book(owner)?.first_active().cloned())
    }

    /// An active account of the owner with the given id
    pub fn account(&self, owner: UserId, id: AccountId) -> Result<Option<Account>, TransferError> {
        Ok(self.book(owner)?.active(id).cloned())
    }

    /// Add a signed amount to an active account
    ///
    /// # Errors
    ///
    /// * `AccountNotFound` if the owner has no active account with that id
    /// * `InsufficientBalance` if the result would be negative
    /// * `ArithmeticOverflow` if the sum overflows
    pub fn apply_delta(
        &mut self,
        owner: UserId,
        id: AccountId,
        delta: Decimal,
    ) -> Result<Account, TransferError> {
        let account = self
            .book_mut(owner)?
            .active_mut(id)
            .ok_or_else(|| TransferError::account_not_found(owner))?;

        let operation = if delta.is_sign_negative() { "debit" } else { "credit" };
        let balance = account
            .balance
            .checked_add(delta)
            .ok_or_else(|| TransferError::arithmetic_overflow(operation, id))?;

        if balance < Decimal::ZERO {
            return Err(TransferError::insufficient_balance(
                id,
                account.balance,
                -delta,
            ));
        }

        account.balance = balance;
        Ok(account.clone())
    }
}

fn not_enlisted(owner: UserId) -> TransferError {
    TransferError::storage_failure(format!(
        "account book of user {} is not part of this unit of work",
        owner
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::thread;

    fn user(id: UserId) -> User {
        User::new(id, format!("user-{}", id))
    }

    #[test]
    fn test_ensure_account_provisions_once() {
        let store = AccountStore::default();
        let owner = user(1);

        let first = store.ensure_account(&owner, Decimal::new(10000, 0)).unwrap();
        let second = store.ensure_account(&owner, Decimal::ZERO).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.balance, Decimal::new(10000, 0));
        assert_eq!(store.accounts_of(1).len(), 1);
    }

    #[test]
    fn test_provisioned_account_uses_user_number_or_generated() {
        let store = AccountStore::new("NeoBank", "NB");

        let named = store
            .ensure_account(&user(1).with_account_number("ACC-1"), Decimal::ZERO)
            .unwrap();
        let generated = store.ensure_account(&user(2), Decimal::ZERO).unwrap();

        assert_eq!(named.number, "ACC-1");
        assert_eq!(named.bank_name, "NeoBank");
        assert!(generated.number.starts_with("NB"));
        assert_eq!(generated.number.len(), 10);
    }

    #[test]
    fn test_concurrent_ensure_creates_single_account() {
        let store = Arc::new(AccountStore::default());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.ensure_account(&user(7), Decimal::new(100, 0)).unwrap())
            })
            .collect();

        let ids: Vec<AccountId> = handles.into_iter().map(|h| h.join().unwrap().id).collect();

        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(store.all_accounts().len(), 1);
    }

    #[rstest]
    #[case::credit(Decimal::new(50, 0), Decimal::new(150, 0))]
    #[case::debit(Decimal::new(-40, 0), Decimal::new(60, 0))]
    #[case::debit_to_zero(Decimal::new(-100, 0), Decimal::ZERO)]
    fn test_apply_delta(#[case] delta: Decimal, #[case] expected: Decimal) {
        let store = AccountStore::default();
        let account = store.ensure_account(&user(1), Decimal::new(100, 0)).unwrap();

        let updated = store.apply_delta(1, account.id, delta).unwrap();

        assert_eq!(updated.balance, expected);
    }

    #[test]
    fn test_apply_delta_rejects_overdraw() {
        let store = AccountStore::default();
        let account = store.ensure_account(&user(1), Decimal::new(100, 0)).unwrap();

        let err = store
            .apply_delta(1, account.id, Decimal::new(-101, 0))
            .unwrap_err();

        assert_eq!(
            err,
            TransferError::insufficient_balance(account.id, Decimal::new(100, 0), Decimal::new(101, 0))
        );
        assert_eq!(store.first_active_account(1).unwrap().balance, Decimal::new(100, 0));
    }

    #[test]
    fn test_apply_delta_overflow() {
        let store = AccountStore::default();
        let account = store.ensure_account(&user(1), Decimal::MAX).unwrap();

        let err = store.apply_delta(1, account.id, Decimal::ONE).unwrap_err();

        assert_eq!(err, TransferError::arithmetic_overflow("credit", account.id));
    }

    #[test]
    fn test_failed_transaction_rolls_back_every_book() {
        let store = AccountStore::default();
        let a = store.ensure_account(&user(1), Decimal::new(100, 0)).unwrap();

        let result: Result<(), TransferError> = store.transaction(&[1, 2], |txn| {
            txn.apply_delta(1, a.id, Decimal::new(-30, 0))?;
            let b = txn.ensure_account(&user(2), Decimal::ZERO)?;
            txn.apply_delta(2, b.id, Decimal::new(30, 0))?;
            Err(TransferError::storage_failure("ledger write failed"))
        });

        assert!(result.is_err());
        assert_eq!(store.first_active_account(1).unwrap().balance, Decimal::new(100, 0));
        assert!(store.first_active_account(2).is_none());
    }

    #[test]
    fn test_transaction_only_sees_enlisted_owners() {
        let store = AccountStore::default();
        store.ensure_account(&user(2), Decimal::ZERO).unwrap();

        let err = store
            .transaction(&[1, 1], |txn| txn.first_active(2))
            .unwrap_err();

        assert_eq!(err.code(), "STORAGE_FAILURE");
    }

    #[test]
    fn test_deactivated_account_is_skipped() {
        let store = AccountStore::default();
        let account = store.ensure_account(&user(1), Decimal::new(5, 0)).unwrap();

        store.deactivate(1, account.id).unwrap();

        assert!(store.accounts_of(1).is_empty());
        assert!(store.first_active_account(1).is_none());
        assert_eq!(store.all_accounts().len(), 1);
        assert_eq!(
            store.apply_delta(1, account.id, Decimal::ONE).unwrap_err(),
            TransferError::account_not_found(1)
        );

        let replacement = store.ensure_account(&user(1), Decimal::ZERO).unwrap();
        assert_ne!(replacement.id, account.id);
    }

    #[test]
    fn test_total_balance() {
        let store = AccountStore::default();
        store.ensure_account(&user(1), Decimal::new(100, 0)).unwrap();
        store.ensure_account(&user(2), Decimal::new(250, 1)).unwrap();

        assert_eq!(store.total_balance(), Decimal::new(1250, 1));
    }
}
