//! In-memory user directory and recipient resolution
//!
//! Users are indexed by every identifier they carry. Registration rejects an
//! identifier value already held by a different user under any class, so a
//! lookup value can never name two users.

use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;
use tracing::debug;

use crate::core::traits::UserDirectory;
use crate::types::{IdentifierKind, TransferError, User, UserId, UserStatus};

/// Thread-safe user directory backed by `DashMap`
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: DashMap<UserId, User>,
    index: DashMap<(IdentifierKind, String), UserId>,
    /// Serializes registrations so the uniqueness check and the index insert
    /// happen as one step
    registration: Mutex<()>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from a list of users
    ///
    /// # Errors
    ///
    /// `DuplicateIdentifier` on the first identifier collision.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Result<Self, TransferError> {
        let directory = Self::new();
        for user in users {
            directory.register(user)?;
        }
        Ok(directory)
    }

    /// Add or replace a user
    ///
    /// Re-registering an existing id replaces that user's identifiers.
    ///
    /// # Errors
    ///
    /// `DuplicateIdentifier` if any identifier value is already held by a
    /// different user, whatever class it is held under.
    pub fn register(&self, user: User) -> Result<(), TransferError> {
        let _guard = self
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        for (kind, value) in user.identifiers() {
            if let Some(owner) = self.holder_of(value) {
                if owner != user.id {
                    return Err(TransferError::duplicate_identifier(kind, value, owner));
                }
            }
        }

        if let Some((_, previous)) = self.users.remove(&user.id) {
            for (kind, value) in previous.identifiers() {
                self.index.remove(&(kind, value.to_string()));
            }
        }

        for (kind, value) in user.identifiers() {
            self.index.insert((kind, value.to_string()), user.id);
        }
        debug!(user = user.id, "registered user");
        self.users.insert(user.id, user);
        Ok(())
    }

    /// The user holding `value` under any identifier class
    fn holder_of(&self, value: &str) -> Option<UserId> {
        IdentifierKind::PRIORITY
            .iter()
            .find_map(|kind| self.lookup(*kind, value))
    }

    fn lookup(&self, kind: IdentifierKind, value: &str) -> Option<UserId> {
        self.index
            .get(&(kind, value.to_string()))
            .map(|entry| *entry.value())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserDirectory for InMemoryDirectory {
    fn resolve(&self, identifier: &str) -> Result<User, TransferError> {
        // exact match only; the CSV reader trims cells
        if identifier.trim().is_empty() {
            return Err(TransferError::recipient_not_found(identifier));
        }

        IdentifierKind::PRIORITY
            .iter()
            .find_map(|kind| {
                self.lookup(*kind, identifier).map(|id| {
                    debug!(identifier, kind = %kind, user = id, "resolved recipient");
                    id
                })
            })
            .and_then(|id| self.get(id))
            .ok_or_else(|| TransferError::recipient_not_found(identifier))
    }

    fn get(&self, id: UserId) -> Option<User> {
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    fn set_status(&self, id: UserId, status: UserStatus) -> Result<UserStatus, TransferError> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| TransferError::user_not_found(id))?;
        Ok(std::mem::replace(&mut user.status, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::with_users([
            User::new(1, "Asha")
                .with_email("asha@neo.bank")
                .with_account_number("NB10000001")
                .with_customer_id("CUST-1")
                .with_public_handle("asha")
                .with_mobile_number("+15550001"),
            User::new(2, "Ravi")
                .with_email("ravi@neo.bank")
                .with_public_handle("ravi"),
            User::new(3, "Mei").with_mobile_number("+15550003").with_email(""),
        ])
        .unwrap()
    }

    #[rstest]
    #[case::email("asha@neo.bank", 1)]
    #[case::account_number("NB10000001", 1)]
    #[case::customer_id("CUST-1", 1)]
    #[case::public_handle("ravi", 2)]
    #[case::mobile("+15550003", 3)]
    fn test_resolve_by_each_identifier(#[case] identifier: &str, #[case] expected: UserId) {
        assert_eq!(directory().resolve(identifier).unwrap().id, expected);
    }

    #[rstest]
    #[case::unknown("nobody@neo.bank")]
    #[case::empty("")]
    #[case::blank("   ")]
    #[case::case_sensitive("ASHA@NEO.BANK")]
    #[case::surrounding_whitespace("  ravi@neo.bank ")]
    fn test_resolve_not_found(#[case] identifier: &str) {
        assert_eq!(
            directory().resolve(identifier).unwrap_err(),
            TransferError::recipient_not_found(identifier)
        );
    }

    #[test]
    fn test_blank_identifier_on_user_never_matches() {
        let directory = directory();
        // user 3 has an empty email, which must not be indexed
        assert!(directory.lookup(IdentifierKind::Email, "").is_none());
    }

    #[test]
    fn test_register_rejects_cross_field_collision() {
        let directory = directory();

        let err = directory
            .register(User::new(4, "Imposter").with_public_handle("asha@neo.bank"))
            .unwrap_err();

        assert_eq!(
            err,
            TransferError::duplicate_identifier(IdentifierKind::PublicHandle, "asha@neo.bank", 1)
        );
        assert!(directory.get(4).is_none());
    }

    #[test]
    fn test_reregister_replaces_identifiers() {
        let directory = directory();

        directory
            .register(User::new(2, "Ravi").with_email("ravi@new.bank"))
            .unwrap();

        assert!(directory.resolve("ravi@neo.bank").is_err());
        assert!(directory.resolve("ravi").is_err());
        assert_eq!(directory.resolve("ravi@new.bank").unwrap().id, 2);
        assert_eq!(directory.len(), 3);
    }

    #[test]
    fn test_set_status_returns_previous() {
        let directory = directory();

        let previous = directory.set_status(2, UserStatus::Frozen).unwrap();

        assert_eq!(previous, UserStatus::Active);
        assert_eq!(directory.get(2).unwrap().status, UserStatus::Frozen);
        assert_eq!(
            directory.set_status(99, UserStatus::Blocked).unwrap_err(),
            TransferError::user_not_found(99)
        );
    }
}
