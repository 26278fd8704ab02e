/*!
 * Untyped table rows as handed over by a loader, before any validation
 */

use std::fmt;
use std::num::ParseIntError;

/// One table cell. `Missing` is distinct from a zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Cell {
    #[default]
    Missing,
    Int(i64),
    Text(String),
}

impl Cell {
    /// Build a cell from raw text. Blank text is a missing cell.
    pub fn text(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Missing
        } else {
            Cell::Text(trimmed.to_owned())
        }
    }

    /// Interpret the cell as an integer.
    ///
    /// Returns `None` for a missing cell. Text is accepted in exactly two forms:
    /// `0x`-prefixed hexadecimal or plain (optionally signed) decimal.
    pub fn integer(&self) -> Option<Result<i128, ParseIntError>> {
        match self {
            Cell::Missing => None,
            Cell::Int(value) => Some(Ok(i128::from(*value))),
            Cell::Text(text) => Some(parse_integer(text)),
        }
    }

    /// Text content of a name-like cell, `None` when missing.
    pub fn as_name(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            Cell::Int(value) => Some(value.to_string()),
            Cell::Text(text) => Some(text.clone()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => f.write_str("<missing>"),
            Cell::Int(value) => write!(f, "{value}"),
            Cell::Text(text) => f.write_str(text),
        }
    }
}

/// Parse `0x1F` / `0X1F` as hexadecimal, anything else as decimal.
pub fn parse_integer(text: &str) -> Result<i128, ParseIntError> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => i128::from_str_radix(hex, 16),
        None => text.parse::<i128>(),
    }
}

/// A signal row exactly as the loader found it.
///
/// `row` is the 1-based row number in the source table, header included,
/// so the first data row is row 2.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub row: usize,
    pub message_id: Cell,
    pub message_name: Cell,
    pub signal_name: Cell,
    pub start_bit: Cell,
    pub end_bit: Cell,
    pub length: Cell,
    pub default_value: Cell,
}
