//! Outbound views of engine results
//!
//! These are the shapes a transport layer would serialize. They never expose
//! internal ids of the counterparty, only display names.

use super::error::TransferError;
use super::ledger::{Direction, EntryStatus, FraudStatus, LedgerEntry, TransferId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Confirmation returned by a successful fraud resolution
pub const RESOLUTION_CONFIRMATION: &str = "Transaction fraud status updated successfully";

/// A ledger entry as its owner sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    pub id: u64,
    pub transfer_id: TransferId,
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub status: EntryStatus,
    pub direction: Direction,
    pub transaction_type: &'static str,
    pub fraud_status: FraudStatus,
    pub flagged_reason: Option<String>,
    pub sender_name: String,
    pub recipient_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&LedgerEntry> for TransactionView {
    fn from(entry: &LedgerEntry) -> Self {
        TransactionView {
            id: entry.id,
            transfer_id: entry.transfer_id.clone(),
            amount: entry.amount,
            category: entry.category.clone(),
            description: entry.description.clone(),
            status: entry.status,
            direction: entry.direction,
            transaction_type: entry.transaction_type(),
            fraud_status: entry.fraud_status,
            flagged_reason: entry.flagged_reason.clone(),
            sender_name: entry.sender_name().to_string(),
            recipient_name: entry.recipient_name().to_string(),
            created_at: entry.created_at,
        }
    }
}

/// Outcome of a transfer request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    pub http_status: u16,
}

impl From<Result<LedgerEntry, TransferError>> for TransferResponse {
    fn from(result: Result<LedgerEntry, TransferError>) -> Self {
        match result {
            Ok(entry) => TransferResponse {
                success: true,
                transaction: Some(TransactionView::from(&entry)),
                error: None,
                code: None,
                http_status: 200,
            },
            Err(e) => TransferResponse {
                success: false,
                transaction: None,
                error: Some(e.to_string()),
                code: Some(e.code()),
                http_status: e.http_status(),
            },
        }
    }
}

/// Outcome of a fraud resolution request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    pub http_status: u16,
}

impl<T> From<Result<T, TransferError>> for ResolutionResponse {
    fn from(result: Result<T, TransferError>) -> Self {
        match result {
            Ok(_) => ResolutionResponse {
                success: true,
                message: RESOLUTION_CONFIRMATION.to_string(),
                code: None,
                http_status: 200,
            },
            Err(e) => ResolutionResponse {
                success: false,
                message: e.to_string(),
                code: Some(e.code()),
                http_status: e.http_status(),
            },
        }
    }
}
