//! I/O module
//!
//! Handles CSV journals in and CSV reports out.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, report serialization)
//! - `sync_reader` - Synchronous journal reader with iterator interface, roster loader
//! - `async_reader` - Asynchronous journal reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_command_record, convert_user_record, write_accounts_csv, write_audit_csv,
    write_ledger_csv, CommandCsvRecord, UserCsvRecord,
};
pub use sync_reader::{read_users, SyncReader};
