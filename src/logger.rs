//! Append-only CSV log of synth settings
//!
//! ```text
//! Timestamp,freq,amp
//! 2024-05-01 12:00:00,440,0.8
//! 2024-05-01 12:00:01,220,
//! ```
//!
//! The header is written once, only when the file is empty at open time.
//! Each append opens the file, writes one row and closes it again, so the
//! log is always complete on disk between messages. Appends to the same
//! logger are serialised by an internal lock.
//!
//! Rows end in a bare `\n` on every platform, not the RFC 4180 `\r\n`.

use crate::codec::SettingsRecord;
use crate::error::Result;
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Name of the first CSV column
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// Appends settings records to a CSV file
pub struct SettingsLogger {
    path: PathBuf,
    columns: Vec<String>,
    /// Held for the duration of one append
    write_lock: Mutex<()>,
}

impl SettingsLogger {
    pub fn new(path: impl Into<PathBuf>, columns: Vec<String>) -> Self {
        Self {
            path: path.into(),
            columns,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Timestamp,<param_1>,...,<param_k>`
    pub fn header_row(&self) -> String {
        let mut row = String::from(TIMESTAMP_COLUMN);
        for name in &self.columns {
            row.push(',');
            row.push_str(&escape_cell(name));
        }
        row
    }

    /// Data row in header order; parameters missing from the record are empty
    pub fn data_row(&self, record: &SettingsRecord) -> String {
        let mut row = escape_cell(&record.timestamp);
        for name in &self.columns {
            row.push(',');
            if let Some(value) = record.get(name) {
                row.push_str(&escape_cell(&value.to_string()));
            }
        }
        row
    }

    /// Append one record, writing the header first if the file is empty
    pub fn append(&self, record: &SettingsRecord) -> Result<()> {
        let _guard = self.write_lock.lock();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = BufWriter::new(file);
        if needs_header {
            writeln!(writer, "{}", self.header_row())?;
        }
        writeln!(writer, "{}", self.data_row(record))?;
        writer.flush()?;

        Ok(())
    }
}

/// Quote a cell if it contains a delimiter, quote or line break
fn escape_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
