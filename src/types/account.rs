//! Account-related types for the transfer engine
//!
//! An account holds the spendable balance of exactly one owner. Accounts are
//! created lazily (auto-provisioned) and are never deleted; closing an account
//! only clears its `active` flag.

use super::user::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Account identifier
///
/// Assigned by the account store in provisioning order.
pub type AccountId = u64;

/// Customer account state
///
/// Represents a single balance-holding account. The balance is a fixed-point
/// currency amount and is never negative after a successful operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// Store-assigned account id
    pub id: AccountId,

    /// The user this account belongs to
    ///
    /// Ownership is exclusive: an account belongs to exactly one owner.
    pub owner: UserId,

    /// Human-facing account number (e.g. `NB7K2Q9XZA`)
    pub number: String,

    /// Institution name shown to the customer
    pub bank_name: String,

    /// Product type, `Savings` for auto-provisioned accounts
    pub account_type: String,

    /// Current balance
    pub balance: Decimal,

    /// Whether the account can take part in transfers
    ///
    /// Only active accounts are selected for debit, credit and refunds.
    pub active: bool,

    /// When the account was provisioned
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new active savings account
    ///
    /// # Arguments
    ///
    /// * `id` - The store-assigned account id
    /// * `owner` - The owning user
    /// * `number` - The account number
    /// * `bank_name` - Institution name
    /// * `balance` - Opening balance
    pub fn new(
        id: AccountId,
        owner: UserId,
        number: impl Into<String>,
        bank_name: impl Into<String>,
        balance: Decimal,
    ) -> Self {
        Account {
            id,
            owner,
            number: number.into(),
            bank_name: bank_name.into(),
            account_type: "Savings".to_string(),
            balance,
            active: true,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_is_active_savings() {
        let account = Account::new(1, 7, "NB00000001", "NeoBank", Decimal::new(1000000, 2));

        assert_eq!(account.id, 1);
        assert_eq!(account.owner, 7);
        assert_eq!(account.number, "NB00000001");
        assert_eq!(account.account_type, "Savings");
        assert_eq!(account.balance, Decimal::new(10000, 0));
        assert!(account.active);
    }
}
