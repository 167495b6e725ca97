//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over replay commands from a CSV journal, and
//! a loader for the user roster. Delegates CSV format concerns to the
//! csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<ReplayCommand, String>` for each CSV row:
//!
//! ```no_run
//! use rust_transfer_engine::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("commands.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(command) => println!("Replaying: {:?}", command),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual record parsing errors are yielded as Err variants in the iterator
//! - Line numbers are included in error messages for debugging

use crate::io::csv_format::{
    convert_command_record, convert_user_record, CommandCsvRecord, UserCsvRecord,
};
use crate::types::{ReplayCommand, User};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

fn open_csv(path: &Path) -> Result<csv::Reader<File>, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    Ok(ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .buffer_capacity(8 * 1024)
        .from_reader(file))
}

/// Synchronous command journal reader
///
/// Provides an iterator interface over replay commands.
/// Maintains streaming behavior with constant memory usage.
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Create a new SyncReader from a file path
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (trailing optional columns may be omitted)
    /// - Use an 8KB buffer for efficient I/O
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the CSV file
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReader)` if file opened successfully
    /// * `Err(String)` if file could not be opened
    pub fn new(path: &Path) -> Result<Self, String> {
        Ok(Self {
            reader: open_csv(path)?,
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<ReplayCommand, String>;

    /// Get the next command from the journal
    ///
    /// # Returns
    ///
    /// * `Some(Ok(ReplayCommand))` - Successfully parsed command
    /// * `Some(Err(String))` - Parse or conversion error with line number
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CommandCsvRecord>();

        let next = deserializer.next()?;
        self.line_num += 1;
        // +1 for the header row
        let line = self.line_num + 1;

        Some(match next {
            Ok(csv_record) => {
                convert_command_record(csv_record).map_err(|e| format!("Line {}: {}", line, e))
            }
            Err(e) => Err(format!("Line {}: CSV parse error: {}", line, e)),
        })
    }
}

/// Read the user roster
///
/// Unlike the command journal, the roster is all-or-nothing: the first bad
/// row fails the whole load.
///
/// # Errors
///
/// Returns an error naming the file or the offending line.
pub fn read_users(path: &Path) -> Result<Vec<User>, String> {
    let mut reader = open_csv(path)?;
    let mut users = Vec::new();

    for (index, result) in reader.deserialize::<UserCsvRecord>().enumerate() {
        let line = index + 2;
        let record = result.map_err(|e| format!("Line {}: CSV parse error: {}", line, e))?;
        users.push(convert_user_record(record).map_err(|e| format!("Line {}: {}", line, e))?);
    }

    Ok(users)
}
