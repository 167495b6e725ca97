//! Audit trail types
//!
//! Audit entries are append-only records of administrative state changes.

use super::user::{User, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Administrative action that was audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    UpdateTransactionFraudStatus,
    UpdateUserStatus,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UpdateTransactionFraudStatus => "UPDATE_TRANSACTION_FRAUD_STATUS",
            AuditAction::UpdateUserStatus => "UPDATE_USER_STATUS",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of object an audited action targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetKind {
    Transaction,
    User,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Transaction => "TRANSACTION",
            TargetKind::User => "USER",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The administrator performing an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: UserId,
    pub email: Option<String>,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// What the core hands to the audit sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub actor: Actor,
    pub action: AuditAction,
    pub target_kind: TargetKind,
    pub target_id: u64,
    pub reason: Option<String>,
    pub details: String,
}

/// A persisted audit entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub id: u64,
    pub actor: Actor,
    pub action: AuditAction,
    pub target_kind: TargetKind,
    pub target_id: u64,
    pub reason: Option<String>,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn from_record(id: u64, record: AuditRecord) -> Self {
        AuditEntry {
            id,
            actor: record.actor,
            action: record.action,
            target_kind: record.target_kind,
            target_id: record.target_id,
            reason: record.reason,
            details: record.details,
            created_at: Utc::now(),
        }
    }
}
