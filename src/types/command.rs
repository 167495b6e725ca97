//! Replay commands
//!
//! One `ReplayCommand` per row of a command journal. Each names the acting
//! user so the batch processor can group commands by the users they touch.

use super::ledger::FraudStatus;
use super::request::TransferRequest;
use super::user::{UserId, UserStatus};
use rust_decimal::Decimal;

/// How a resolve command names its target entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRef {
    /// A label assigned by an earlier transfer's `ref` column
    Label(String),
    /// A raw ledger entry id
    Id(u64),
}

/// A single replayable operation
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayCommand {
    /// External credit into the actor's account
    Credit { actor: UserId, amount: Decimal },

    /// Transfer from the actor; `label` names the resulting sender leg
    Transfer {
        actor: UserId,
        request: TransferRequest,
        label: Option<String>,
    },

    /// Admin decision on a held entry
    Resolve {
        actor: UserId,
        target: EntryRef,
        status: FraudStatus,
        reason: Option<String>,
    },

    /// Admin change of a user's status
    UserStatus {
        actor: UserId,
        target: UserId,
        status: UserStatus,
        reason: Option<String>,
    },
}

impl ReplayCommand {
    pub fn actor(&self) -> UserId {
        match self {
            ReplayCommand::Credit { actor, .. }
            | ReplayCommand::Transfer { actor, .. }
            | ReplayCommand::Resolve { actor, .. }
            | ReplayCommand::UserStatus { actor, .. } => *actor,
        }
    }

    /// Admin commands observe every earlier command and are observed by every
    /// later one, so concurrent replay must not reorder across them
    pub fn is_barrier(&self) -> bool {
        matches!(
            self,
            ReplayCommand::Resolve { .. } | ReplayCommand::UserStatus { .. }
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ReplayCommand::Credit { .. } => "credit",
            ReplayCommand::Transfer { .. } => "transfer",
            ReplayCommand::Resolve { .. } => "resolve",
            ReplayCommand::UserStatus { .. } => "user_status",
        }
    }
}
