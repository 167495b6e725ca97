//! Processing strategy module for journal replay
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! encompassing both CSV parsing and command processing. This allows
//! different replay implementations (synchronous, asynchronous batch) to be
//! selected at runtime against the same `BankCore`.

use crate::cli::StrategyType;
use crate::core::{BankCore, ReplayStats};
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete replay pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Replay a command journal into a bank and write the final accounts
    ///
    /// # Arguments
    ///
    /// * `bank` - The bank to replay into; its state is kept after the call
    /// * `input_path` - Path to the command journal CSV
    /// * `output` - Writer receiving the accounts CSV
    ///
    /// # Returns
    ///
    /// * `Ok(ReplayStats)` once every row was read (rejected and malformed
    ///   rows are counted, not fatal)
    /// * `Err(String)` if a fatal error occurred
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened
    /// - A runtime cannot be created
    /// - Output cannot be written
    fn process(
        &self,
        bank: &BankCore,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<ReplayStats, String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `config` - Optional configuration for async batch processing (ignored for sync)
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config))
        }
    }
}
