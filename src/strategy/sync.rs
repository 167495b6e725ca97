//! Synchronous processing strategy
//!
//! Replays a journal one command at a time, in file order, on the calling
//! thread.
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Command handling to `CommandProcessor`
//! - CSV output to `csv_format::write_accounts_csv`

use crate::core::{BankCore, CommandProcessor, ReplayStats};
use crate::io::csv_format::write_accounts_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::ProcessingStrategy;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use rust_transfer_engine::config::EngineConfig;
/// use rust_transfer_engine::core::BankCore;
/// use rust_transfer_engine::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let bank = BankCore::new(EngineConfig::default(), Vec::new()).unwrap();
/// let mut output = io::stdout();
///
/// SyncProcessingStrategy
///     .process(&bank, Path::new("commands.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    /// Replay the journal in file order
    ///
    /// Fatal errors (file not found, I/O errors) are returned immediately.
    /// Rejected commands and malformed rows are logged and replay continues.
    fn process(
        &self,
        bank: &BankCore,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<ReplayStats, String> {
        let processor = CommandProcessor::new(bank.clone());
        let reader = SyncReader::new(input_path)?;
        let mut stats = ReplayStats::default();

        for result in reader {
            match result {
                Ok(command) => stats.record(&processor.process(command)),
                Err(e) => {
                    stats.malformed += 1;
                    warn!("CSV parsing error: {}", e);
                }
            }
        }

        info!(
            applied = stats.applied,
            rejected = stats.rejected,
            malformed = stats.malformed,
            "sync replay finished"
        );

        write_accounts_csv(&bank.accounts().all_accounts(), output)?;

        Ok(stats)
    }
}
