//! CSV format handling for replay journals and report output
//!
//! This module centralizes all CSV format concerns, providing:
//! - `CommandCsvRecord` / `UserCsvRecord` structures for deserialization
//! - Conversion from CSV records to domain types
//! - Account, ledger and audit output serialization
//!
//! All functions are pure (no I/O beyond the supplied writer) for easy testing.

use crate::types::{
    Account, AccountId, AuditEntry, EntryRef, FraudStatus, LedgerEntry, ReplayCommand, Role,
    TransactionView, TransferError, TransferRequest, User, UserId, UserStatus,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Amounts in a journal carry at most cents
pub const MAX_AMOUNT_SCALE: u32 = 2;

/// CSV record structure for a command journal row
///
/// Columns: type, actor, target, amount, pin, account, category, description,
/// ref, status, reason. Only `type` and `actor` are present on every row; the
/// rest depend on the command type.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct CommandCsvRecord {
    #[serde(rename = "type")]
    pub command_type: String,
    pub actor: UserId,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub pin: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "ref")]
    pub label: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// CSV record structure for a user roster row
///
/// Columns: id, name, email, account_number, customer_id, handle, mobile, role
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct UserCsvRecord {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

fn present(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(field: Option<String>, column: &str, record: &CommandCsvRecord) -> Result<String, String> {
    present(field).ok_or_else(|| {
        format!(
            "{} command for actor {} requires '{}'",
            record.command_type, record.actor, column
        )
    })
}

/// Parse a journal amount
///
/// Rejects non-numeric values and values with more than two decimal places.
/// Sign is not checked here; the engine rejects non-positive amounts.
pub fn parse_amount(raw: &str) -> Result<Decimal, String> {
    let amount =
        Decimal::from_str(raw.trim()).map_err(|_| format!("Invalid amount '{}'", raw))?;
    if amount.scale() > MAX_AMOUNT_SCALE {
        return Err(format!(
            "Invalid amount '{}': more than {} decimal places",
            raw, MAX_AMOUNT_SCALE
        ));
    }
    Ok(amount)
}

/// Convert a CommandCsvRecord to a ReplayCommand
///
/// This function:
/// - Parses the command type (case-insensitive)
/// - Validates that the columns the command needs are present
/// - Parses amounts, statuses and numeric references
///
/// # Arguments
///
/// * `record` - The deserialized CSV record
///
/// # Returns
///
/// Result containing either:
/// - Ok(ReplayCommand) - Successfully converted command
/// - Err(String) - Error message describing the conversion failure
pub fn convert_command_record(record: CommandCsvRecord) -> Result<ReplayCommand, String> {
    let actor = record.actor;

    match record.command_type.trim().to_lowercase().as_str() {
        "credit" => {
            let amount = parse_amount(&required(record.amount.clone(), "amount", &record)?)?;
            Ok(ReplayCommand::Credit { actor, amount })
        }
        "transfer" => {
            let recipient = required(record.target.clone(), "target", &record)?;
            let amount = parse_amount(&required(record.amount.clone(), "amount", &record)?)?;
            let sender_account = match present(record.account) {
                Some(raw) => Some(
                    raw.parse::<AccountId>()
                        .map_err(|_| format!("Invalid account id '{}'", raw))?,
                ),
                None => None,
            };

            let mut request =
                TransferRequest::new(recipient, amount, record.pin.unwrap_or_default());
            if let Some(description) = present(record.description) {
                request = request.with_description(description);
            }
            if let Some(category) = present(record.category) {
                request = request.with_category(category);
            }
            if let Some(account) = sender_account {
                request = request.with_sender_account(account);
            }

            Ok(ReplayCommand::Transfer {
                actor,
                request,
                label: present(record.label),
            })
        }
        "resolve" => {
            let target = required(record.target.clone(), "target", &record)?;
            let status = required(record.status.clone(), "status", &record)?;
            let status = FraudStatus::from_str(&status).map_err(|e| e.to_string())?;
            if !status.is_decision() {
                return Err(TransferError::invalid_status(status.as_str()).to_string());
            }
            let target = match target.parse::<u64>() {
                Ok(id) => EntryRef::Id(id),
                Err(_) => EntryRef::Label(target),
            };

            Ok(ReplayCommand::Resolve {
                actor,
                target,
                status,
                reason: present(record.reason),
            })
        }
        "user_status" => {
            let target = required(record.target.clone(), "target", &record)?;
            let target = target
                .parse::<UserId>()
                .map_err(|_| format!("Invalid user id '{}'", target))?;
            let status = required(record.status.clone(), "status", &record)?;
            let status = UserStatus::from_str(&status).map_err(|e| e.to_string())?;

            Ok(ReplayCommand::UserStatus {
                actor,
                target,
                status,
                reason: present(record.reason),
            })
        }
        _ => Err(format!(
            "Invalid command type: '{}' for actor {}",
            record.command_type, actor
        )),
    }
}

/// Convert a UserCsvRecord to a User
///
/// Empty identifier cells become absent identifiers. `role` is `user` when
/// empty.
pub fn convert_user_record(record: UserCsvRecord) -> Result<User, String> {
    let role = match present(record.role).map(|r| r.to_lowercase()).as_deref() {
        None | Some("user") => Role::User,
        Some("admin") => Role::Admin,
        Some(other) => return Err(format!("Invalid role '{}' for user {}", other, record.id)),
    };

    Ok(User {
        id: record.id,
        name: record.name.trim().to_string(),
        email: present(record.email),
        account_number: present(record.account_number),
        customer_id: present(record.customer_id),
        public_handle: present(record.handle),
        mobile_number: present(record.mobile),
        role,
        status: UserStatus::Active,
    })
}

/// Write account states to CSV format
///
/// Writes accounts in CSV format with columns: owner, number, balance, active
/// Accounts are sorted by owner, then account id, for deterministic output.
///
/// # Arguments
///
/// * `accounts` - Slice of account states to write
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["owner", "number", "balance", "active"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by_key(|account| (account.owner, account.id));

    for account in sorted_accounts {
        writer
            .write_record(&[
                account.owner.to_string(),
                account.number.clone(),
                format!("{:.2}", account.balance),
                account.active.to_string(),
            ])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write ledger entries to CSV format, ordered by entry id
pub fn write_ledger_csv(entries: &[LedgerEntry], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "id",
            "transfer_id",
            "owner",
            "direction",
            "type",
            "sender",
            "recipient",
            "amount",
            "category",
            "description",
            "status",
            "fraud_status",
            "flagged_reason",
            "created_at",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_entries = entries.to_vec();
    sorted_entries.sort_by_key(|entry| entry.id);

    for entry in sorted_entries {
        let view = TransactionView::from(&entry);
        writer
            .write_record(&[
                view.id.to_string(),
                view.transfer_id.to_string(),
                entry.owner.to_string(),
                view.direction.to_string(),
                view.transaction_type.to_string(),
                view.sender_name,
                view.recipient_name,
                format!("{:.2}", view.amount),
                view.category,
                view.description,
                view.status.as_str().to_string(),
                view.fraud_status.to_string(),
                view.flagged_reason.unwrap_or_default(),
                view.created_at.to_rfc3339(),
            ])
            .map_err(|e| format!("Failed to write ledger record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write audit entries to CSV format, ordered by entry id
pub fn write_audit_csv(entries: &[AuditEntry], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "id",
            "admin",
            "action",
            "target_kind",
            "target_id",
            "reason",
            "details",
            "created_at",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_entries = entries.to_vec();
    sorted_entries.sort_by_key(|entry| entry.id);

    for entry in sorted_entries {
        writer
            .write_record(&[
                entry.id.to_string(),
                entry.actor.id.to_string(),
                entry.action.to_string(),
                entry.target_kind.to_string(),
                entry.target_id.to_string(),
                entry.reason.clone().unwrap_or_default(),
                entry.details.clone(),
                entry.created_at.to_rfc3339(),
            ])
            .map_err(|e| format!("Failed to write audit record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(command_type: &str) -> CommandCsvRecord {
        CommandCsvRecord {
            command_type: command_type.to_string(),
            actor: 1,
            ..Default::default()
        }
    }

    fn some(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn test_convert_transfer_record() {
        let csv_record = CommandCsvRecord {
            target: some("ravi@neo.bank"),
            amount: some("250.50"),
            pin: some("1234"),
            account: some("3"),
            category: some("Rent"),
            description: some("March"),
            label: some("rent-march"),
            ..record("TRANSFER")
        };

        let command = convert_command_record(csv_record).unwrap();

        let expected = TransferRequest::new("ravi@neo.bank", Decimal::new(25050, 2), "1234")
            .with_description("March")
            .with_category("Rent")
            .with_sender_account(3);
        assert_eq!(
            command,
            ReplayCommand::Transfer {
                actor: 1,
                request: expected,
                label: some("rent-march"),
            }
        );
    }

    #[test]
    fn test_transfer_blank_optionals_are_absent() {
        let csv_record = CommandCsvRecord {
            target: some("ravi"),
            amount: some("10"),
            category: some("   "),
            label: some(""),
            ..record("transfer")
        };

        match convert_command_record(csv_record).unwrap() {
            ReplayCommand::Transfer { request, label, .. } => {
                assert_eq!(request.category, None);
                assert_eq!(request.sender_account, None);
                assert_eq!(request.pin, "");
                assert_eq!(label, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[rstest]
    #[case::label("car", EntryRef::Label("car".to_string()))]
    #[case::raw_id("17", EntryRef::Id(17))]
    fn test_convert_resolve_target(#[case] target: &str, #[case] expected: EntryRef) {
        let csv_record = CommandCsvRecord {
            target: some(target),
            status: some("approved"),
            reason: some("verified by phone"),
            ..record("resolve")
        };

        assert_eq!(
            convert_command_record(csv_record).unwrap(),
            ReplayCommand::Resolve {
                actor: 1,
                target: expected,
                status: FraudStatus::Approved,
                reason: some("verified by phone"),
            }
        );
    }

    #[test]
    fn test_convert_user_status_and_credit() {
        let status = CommandCsvRecord {
            target: some("4"),
            status: some("FROZEN"),
            ..record("user_status")
        };
        assert_eq!(
            convert_command_record(status).unwrap(),
            ReplayCommand::UserStatus {
                actor: 1,
                target: 4,
                status: UserStatus::Frozen,
                reason: None,
            }
        );

        let credit = CommandCsvRecord {
            amount: some("  99.9 "),
            ..record("Credit")
        };
        assert_eq!(
            convert_command_record(credit).unwrap(),
            ReplayCommand::Credit {
                actor: 1,
                amount: Decimal::new(999, 1),
            }
        );
    }

    #[rstest]
    #[case::invalid_type(record("withdrawal"), "Invalid command type")]
    #[case::credit_missing_amount(record("credit"), "requires 'amount'")]
    #[case::transfer_missing_target(
        CommandCsvRecord { amount: Some("1".to_string()), ..record("transfer") },
        "requires 'target'"
    )]
    #[case::invalid_amount(
        CommandCsvRecord { amount: Some("ten".to_string()), ..record("credit") },
        "Invalid amount"
    )]
    #[case::sub_cent_amount(
        CommandCsvRecord { amount: Some("1.005".to_string()), ..record("credit") },
        "decimal places"
    )]
    #[case::bad_account(
        CommandCsvRecord {
            target: Some("ravi".to_string()),
            amount: Some("1".to_string()),
            account: Some("primary".to_string()),
            ..record("transfer")
        },
        "Invalid account id"
    )]
    #[case::bad_fraud_status(
        CommandCsvRecord {
            target: Some("car".to_string()),
            status: Some("MAYBE".to_string()),
            ..record("resolve")
        },
        "Invalid status"
    )]
    #[case::reopen_status(
        CommandCsvRecord {
            target: Some("car".to_string()),
            status: Some("pending".to_string()),
            ..record("resolve")
        },
        "Invalid status 'PENDING'"
    )]
    #[case::bad_user_target(
        CommandCsvRecord {
            target: Some("ravi".to_string()),
            status: Some("BLOCKED".to_string()),
            ..record("user_status")
        },
        "Invalid user id"
    )]
    fn test_convert_command_record_errors(
        #[case] csv_record: CommandCsvRecord,
        #[case] expected_error: &str,
    ) {
        let result = convert_command_record(csv_record);
        assert!(result.is_err());
        let error = result.unwrap_err();
        assert!(error.contains(expected_error), "got: {}", error);
    }

    #[test]
    fn test_convert_user_record() {
        let user = convert_user_record(UserCsvRecord {
            id: 9,
            name: " Ops ".to_string(),
            email: some("ops@neo.bank"),
            account_number: some(""),
            handle: some("ops"),
            role: some("ADMIN"),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(user.name, "Ops");
        assert_eq!(user.email.as_deref(), Some("ops@neo.bank"));
        assert_eq!(user.account_number, None);
        assert_eq!(user.public_handle.as_deref(), Some("ops"));
        assert!(user.is_admin());

        let err = convert_user_record(UserCsvRecord {
            id: 2,
            name: "Ravi".to_string(),
            role: some("root"),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.contains("Invalid role"));
    }

    #[rstest]
    #[case::sorted_by_owner(
        vec![
            Account::new(2, 2, "NB00000002", "NeoBank", Decimal::new(100, 0)),
            Account::new(1, 1, "NB00000001", "NeoBank", Decimal::new(999950, 2)),
        ],
        "owner,number,balance,active\n1,NB00000001,9999.50,true\n2,NB00000002,100.00,true\n"
    )]
    #[case::empty_accounts(vec![], "owner,number,balance,active\n")]
    fn test_write_accounts_csv(#[case] accounts: Vec<Account>, #[case] expected_output: &str) {
        let mut output = Vec::new();
        let result = write_accounts_csv(&accounts, &mut output);
        assert!(result.is_ok());

        let output_str = String::from_utf8(output).unwrap();
        assert_eq!(output_str, expected_output);
    }

    #[test]
    fn test_write_accounts_csv_marks_inactive() {
        let mut account = Account::new(1, 1, "NB1", "NeoBank", Decimal::ZERO);
        account.active = false;

        let mut output = Vec::new();
        write_accounts_csv(&[account], &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "owner,number,balance,active\n1,NB1,0.00,false\n"
        );
    }
}
