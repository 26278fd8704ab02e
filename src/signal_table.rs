/*!
 * Reads signal definition tables exported as delimited text (CSV, TSV, semicolon separated)
 */

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::raw_row::{Cell, RawRow};

pub const COLUMN_MESSAGE_ID: &str = "PID";
pub const COLUMN_MESSAGE_NAME: &str = "PIDname";
pub const COLUMN_SIGNAL_NAME: &str = "SignalName";
pub const COLUMN_START_BIT: &str = "StartBit";
pub const COLUMN_END_BIT: &str = "EndBit";
pub const COLUMN_LENGTH: &str = "Length";
pub const COLUMN_DEFAULT_VALUE: &str = "DefaultValue";

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to read signal table: {0}")]
    Io(#[from] io::Error),
    #[error("signal table is empty (no header row)")]
    Empty,
    #[error("signal table is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("signal table has no position column (StartBit, EndBit or Length)")]
    MissingPositionColumns,
}

/// Rows handed to the compiler, plus anything the loader itself had to report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalTable {
    pub rows: Vec<RawRow>,
    /// Whether the source has a default value column at all.
    pub has_default_column: bool,
    pub diagnostics: Diagnostics,
}

impl SignalTable {
    pub fn from_rows(rows: Vec<RawRow>, has_default_column: bool) -> Self {
        SignalTable {
            rows,
            has_default_column,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Load a table from a file path
    pub fn from_file(path: &Path) -> Result<Self, TableError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a table from any type that implements the BufRead trait.
    ///
    /// The first line is the header. Row numbers count the header as row 1;
    /// blank lines are skipped but still counted.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, TableError> {
        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(TableError::Empty),
        };
        let header = header.trim_start_matches('\u{feff}');
        let delimiter = detect_delimiter(header);
        let columns = ColumnMap::from_header(&split_record(header, delimiter))?;

        let mut rows = Vec::new();
        for (index, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            rows.push(columns.row(&split_record(&line, delimiter), index + 2));
        }
        debug!(
            rows = rows.len(),
            delimiter = ?delimiter,
            has_default_column = columns.default_value.is_some(),
            "read signal table"
        );

        Ok(SignalTable::from_rows(rows, columns.default_value.is_some()))
    }
}

/// Tab wins over semicolon, semicolon over comma.
pub fn detect_delimiter(header: &str) -> char {
    if header.contains('\t') {
        '\t'
    } else if header.contains(';') {
        ';'
    } else {
        ','
    }
}

/// Split one record. Double-quoted fields may contain the delimiter; `""`
/// inside quotes is a literal quote.
pub fn split_record(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => fields.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Column positions resolved from the header row.
#[derive(Debug)]
struct ColumnMap {
    message_id: usize,
    message_name: usize,
    signal_name: usize,
    start_bit: Option<usize>,
    end_bit: Option<usize>,
    length: Option<usize>,
    default_value: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &[String]) -> Result<Self, TableError> {
        let find = |name: &str| header.iter().position(|h| h.trim().eq_ignore_ascii_case(name));

        let required = [COLUMN_MESSAGE_ID, COLUMN_MESSAGE_NAME, COLUMN_SIGNAL_NAME];
        let missing: Vec<String> = required
            .iter()
            .filter(|&&name| find(name).is_none())
            .map(|name| name.to_string())
            .collect();
        let (Some(message_id), Some(message_name), Some(signal_name)) = (
            find(COLUMN_MESSAGE_ID),
            find(COLUMN_MESSAGE_NAME),
            find(COLUMN_SIGNAL_NAME),
        ) else {
            return Err(TableError::MissingColumns(missing));
        };

        let columns = ColumnMap {
            message_id,
            message_name,
            signal_name,
            start_bit: find(COLUMN_START_BIT),
            end_bit: find(COLUMN_END_BIT),
            length: find(COLUMN_LENGTH),
            default_value: find(COLUMN_DEFAULT_VALUE),
        };
        if columns.start_bit.is_none() && columns.end_bit.is_none() && columns.length.is_none() {
            return Err(TableError::MissingPositionColumns);
        }
        Ok(columns)
    }

    fn row(&self, fields: &[String], row: usize) -> RawRow {
        let cell = |index: Option<usize>| {
            index
                .and_then(|i| fields.get(i))
                .map(|field| Cell::text(field))
                .unwrap_or_default()
        };
        RawRow {
            row,
            message_id: cell(Some(self.message_id)),
            message_name: cell(Some(self.message_name)),
            signal_name: cell(Some(self.signal_name)),
            start_bit: cell(self.start_bit),
            end_bit: cell(self.end_bit),
            length: cell(self.length),
            default_value: cell(self.default_value),
        }
    }
}
