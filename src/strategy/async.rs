//! Asynchronous batch processing strategy
//!
//! This module provides an asynchronous, multi-threaded implementation of the
//! ProcessingStrategy trait. It replays a journal in batches with party-based
//! partitioning.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (party partitioning + barriers)
//!         └── CommandProcessor → BankCore
//! ```
//!
//! # Ordering
//!
//! - Batches are processed one after another
//! - Within a batch, users linked by a transfer form one group, and each
//!   group's commands run in journal order on their own task
//! - `resolve` and `user_status` rows split a batch and run alone
//!
//! Groups never touch the same account, so the final state equals the sync
//! replay.

use crate::core::{BankCore, BatchProcessor, CommandProcessor, ReplayStats};
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_accounts_csv;
use crate::strategy::ProcessingStrategy;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Configuration for batch processing
///
/// Controls how commands are batched and the number of worker threads
/// for parallel processing within each batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of commands per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// Zero values fall back to the defaults with a warning.
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                "invalid batch_size ({}), using default ({})",
                batch_size, default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                "invalid max_concurrent_batches ({}), using default ({})",
                max_concurrent_batches, default.max_concurrent_batches
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
///
/// # Configuration
///
/// The strategy accepts a BatchConfig with:
/// - `batch_size`: Number of commands per batch (default: 1000)
/// - `max_concurrent_batches`: Number of worker threads (default: CPU cores)
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    /// Create a new AsyncProcessingStrategy with the specified configuration
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Replay the journal batch by batch on a multi-threaded tokio runtime
    ///
    /// Fatal errors (file not found, runtime errors) are returned immediately.
    /// Rejected commands and malformed rows are logged and replay continues.
    fn process(
        &self,
        bank: &BankCore,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<ReplayStats, String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let stats = runtime.block_on(async {
            let processor = BatchProcessor::new(CommandProcessor::new(bank.clone()));

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut stats = ReplayStats::default();
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                // Finish this batch before reading the next one so an actor's
                // commands never overtake each other across batches
                for result in processor.process_batch(batch).await {
                    stats.record(&result.result);
                }
            }
            stats.malformed = reader.malformed();

            Ok::<_, String>(stats)
        })?;

        info!(
            applied = stats.applied,
            rejected = stats.rejected,
            malformed = stats.malformed,
            batch_size = self.config.batch_size,
            workers = self.config.max_concurrent_batches,
            "async replay finished"
        );

        write_accounts_csv(&bank.accounts().all_accounts(), output)?;

        Ok(stats)
    }
}
