//! User status administration
//!
//! Admins can mark a user `ACTIVE`, `BLOCKED` or `FROZEN`. The status is
//! recorded and audited; the transfer engine does not consult it.

use std::sync::Arc;

use tracing::info;

use crate::core::traits::{AuditSink, UserDirectory};
use crate::types::{
    Actor, AuditAction, AuditRecord, TargetKind, TransferError, User, UserId, UserStatus,
};

#[derive(Clone)]
pub struct UserStatusService {
    directory: Arc<dyn UserDirectory>,
    audit: Arc<dyn AuditSink>,
}

impl UserStatusService {
    pub fn new(directory: Arc<dyn UserDirectory>, audit: Arc<dyn AuditSink>) -> Self {
        Self { directory, audit }
    }

    /// Set a user's status and audit the change
    ///
    /// # Returns
    ///
    /// The status the user had before.
    ///
    /// # Errors
    ///
    /// * `Forbidden` if `admin` lacks the admin role
    /// * `UserNotFound` if the target does not exist
    pub fn update_user_status(
        &self,
        admin: &User,
        target: UserId,
        status: UserStatus,
        reason: Option<String>,
    ) -> Result<UserStatus, TransferError> {
        if !admin.is_admin() {
            return Err(TransferError::forbidden(admin.id, "update user status"));
        }

        let previous = self.directory.set_status(target, status)?;

        self.audit.record(AuditRecord {
            actor: Actor::from(admin),
            action: AuditAction::UpdateUserStatus,
            target_kind: TargetKind::User,
            target_id: target,
            reason,
            details: format!("Status changed to: {}", status),
        });

        info!(user = target, admin = admin.id, previous = %previous, current = %status, "user status updated");
        Ok(previous)
    }
}
