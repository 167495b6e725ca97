//! Identity types
//!
//! A user exposes five independent identifiers, any of which can address them
//! as a transfer recipient. Absent identifiers are `None` and never match.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::TransferError;

/// User identifier
pub type UserId = u64;

/// The identifier classes a recipient can be addressed by
///
/// Declaration order is the resolution priority: the directory tries each
/// class in this order and stops at the first match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    Email,
    AccountNumber,
    CustomerId,
    PublicHandle,
    MobileNumber,
}

impl IdentifierKind {
    /// All identifier classes in resolution priority order
    pub const PRIORITY: [IdentifierKind; 5] = [
        IdentifierKind::Email,
        IdentifierKind::AccountNumber,
        IdentifierKind::CustomerId,
        IdentifierKind::PublicHandle,
        IdentifierKind::MobileNumber,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Email => "email",
            IdentifierKind::AccountNumber => "account_number",
            IdentifierKind::CustomerId => "customer_id",
            IdentifierKind::PublicHandle => "public_handle",
            IdentifierKind::MobileNumber => "mobile_number",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Administrative status of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    #[default]
    Active,
    Blocked,
    Frozen,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Blocked => "BLOCKED",
            UserStatus::Frozen => "FROZEN",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(UserStatus::Active),
            "BLOCKED" => Ok(UserStatus::Blocked),
            "FROZEN" => Ok(UserStatus::Frozen),
            _ => Err(TransferError::invalid_status(s)),
        }
    }
}

/// A customer or administrator known to the identity directory
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    /// Display name used for ledger party names
    pub name: String,

    pub email: Option<String>,
    pub account_number: Option<String>,
    pub customer_id: Option<String>,
    pub public_handle: Option<String>,
    pub mobile_number: Option<String>,

    #[serde(default)]
    pub role: Role,

    #[serde(default)]
    pub status: UserStatus,
}

impl User {
    /// Create a user with only a name; identifiers are attached with the
    /// `with_*` builders
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        User {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_account_number(mut self, number: impl Into<String>) -> Self {
        self.account_number = Some(number.into());
        self
    }

    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_public_handle(mut self, handle: impl Into<String>) -> Self {
        self.public_handle = Some(handle.into());
        self
    }

    pub fn with_mobile_number(mut self, mobile: impl Into<String>) -> Self {
        self.mobile_number = Some(mobile.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The identifier of the given class, if present and non-blank
    pub fn identifier(&self, kind: IdentifierKind) -> Option<&str> {
        let value = match kind {
            IdentifierKind::Email => self.email.as_deref(),
            IdentifierKind::AccountNumber => self.account_number.as_deref(),
            IdentifierKind::CustomerId => self.customer_id.as_deref(),
            IdentifierKind::PublicHandle => self.public_handle.as_deref(),
            IdentifierKind::MobileNumber => self.mobile_number.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    /// All present identifiers with their class
    pub fn identifiers(&self) -> impl Iterator<Item = (IdentifierKind, &str)> {
        IdentifierKind::PRIORITY
            .into_iter()
            .filter_map(move |kind| self.identifier(kind).map(|value| (kind, value)))
    }
}
