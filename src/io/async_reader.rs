//! Asynchronous CSV reader with batch interface
//!
//! Provides batch reading over a command journal for the async replay
//! strategy.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - the same `csv_format` conversion as the sync reader
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of ReplayCommands
//!                  ↓
//!           csv_format module
//!           (CommandCsvRecord, convert_command_record)
//! ```

use crate::io::csv_format::{convert_command_record, CommandCsvRecord};
use crate::types::ReplayCommand;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous command journal reader
///
/// Malformed rows are logged, counted and skipped.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: usize,
    malformed: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader from an async reader
    ///
    /// # Arguments
    ///
    /// * `reader` - Async reader providing CSV data
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 0,
            malformed: 0,
        }
    }

    /// Read a batch of commands
    ///
    /// Reads up to `batch_size` valid commands. Invalid rows do not count
    /// towards the batch size.
    ///
    /// # Returns
    ///
    /// A vector of successfully converted commands, in journal order.
    /// Returns an empty vector when the end of the file is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<ReplayCommand> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CommandCsvRecord>();

        while batch.len() < batch_size {
            let next = match records.next().await {
                Some(next) => next,
                None => break,
            };
            self.line_num += 1;
            let line = self.line_num + 1;

            match next {
                Ok(csv_record) => match convert_command_record(csv_record) {
                    Ok(command) => batch.push(command),
                    Err(e) => {
                        self.malformed += 1;
                        warn!(line, "record conversion error: {}", e);
                    }
                },
                Err(e) => {
                    self.malformed += 1;
                    warn!(line, "CSV parse error: {}", e);
                }
            }
        }

        batch
    }

    /// Rows skipped so far because they could not be parsed
    pub fn malformed(&self) -> usize {
        self.malformed
    }
}
