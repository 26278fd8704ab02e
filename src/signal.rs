/*!
 * Turns raw table rows into validated signals
 */

use serde::Serialize;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::raw_row::{Cell, RawRow};

/// A validated signal: a named, LSB-first bit range inside one message.
///
/// Bit positions are global within the message, bit 0 being the LSB of byte 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    pub message_id: u32,
    pub message_name: String,
    pub name: String,
    pub start_bit: u32,
    pub end_bit: u32,
    pub length: u32,
    pub default_value: Option<u64>,
    /// Source table row, for diagnostics raised after normalization.
    pub row: usize,
}

impl Signal {
    /// Largest raw value that fits in `length` bits.
    pub fn max_value(&self) -> u64 {
        if self.length >= 64 {
            u64::MAX
        } else {
            (1u64 << self.length) - 1
        }
    }
}

/// Validate one row.
///
/// A row-fatal problem comes back as `Err` and the row must be dropped. Warnings
/// ride along with the accepted signal.
pub fn normalize_row(row: &RawRow) -> Result<(Signal, Diagnostics), Diagnostic> {
    let fail = |kind| Diagnostic::new(row.row, kind);

    let message_id = parse_identifier(&row.message_id).map_err(fail)?;
    let (message_name, name) = match (row.message_name.as_name(), row.signal_name.as_name()) {
        (Some(message_name), Some(name)) => (message_name, name),
        _ => return Err(fail(DiagnosticKind::MissingName)),
    };

    let start = position(&row.start_bit, "StartBit")
        .map_err(fail)?
        .ok_or_else(|| fail(DiagnosticKind::MissingStartBit))?;
    if start < 0 {
        return Err(fail(DiagnosticKind::InvalidPosition {
            field: "StartBit",
            value: row.start_bit.to_string(),
        }));
    }
    let end = position(&row.end_bit, "EndBit").map_err(fail)?;
    let declared_length = position(&row.length, "Length").map_err(fail)?;
    let (end, length) = resolve_extent(start, end, declared_length).map_err(fail)?;

    if length <= 0 {
        return Err(fail(DiagnosticKind::InvalidLength { length }));
    }
    if end < start {
        return Err(fail(DiagnosticKind::EndBeforeStart {
            start_bit: start,
            end_bit: end,
        }));
    }

    let mut signal = Signal {
        message_id,
        message_name,
        name,
        start_bit: narrow(start, "StartBit").map_err(fail)?,
        end_bit: narrow(end, "EndBit").map_err(fail)?,
        length: narrow(length, "Length").map_err(fail)?,
        default_value: None,
        row: row.row,
    };

    let mut warnings = Diagnostics::default();
    signal.default_value = parse_default(&row.default_value, &signal, &mut warnings);
    Ok((signal, warnings))
}

/// Normalize every row in order. Rejected rows are left out and reported; later
/// rows are still processed.
pub fn normalize_rows(rows: &[RawRow]) -> (Vec<Signal>, Diagnostics) {
    let mut signals = Vec::with_capacity(rows.len());
    let mut diagnostics = Diagnostics::default();
    for row in rows {
        match normalize_row(row) {
            Ok((signal, warnings)) => {
                signals.push(signal);
                diagnostics.extend(warnings);
            }
            Err(error) => diagnostics.push(error),
        }
    }
    (signals, diagnostics)
}

fn parse_identifier(cell: &Cell) -> Result<u32, DiagnosticKind> {
    let invalid = || DiagnosticKind::InvalidIdentifier {
        value: cell.to_string(),
    };
    match cell.integer() {
        Some(Ok(value)) => u32::try_from(value).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn position(cell: &Cell, field: &'static str) -> Result<Option<i64>, DiagnosticKind> {
    let invalid = || DiagnosticKind::InvalidPosition {
        field,
        value: cell.to_string(),
    };
    match cell.integer() {
        None => Ok(None),
        Some(Ok(value)) => i64::try_from(value).map(Some).map_err(|_| invalid()),
        Some(Err(_)) => Err(invalid()),
    }
}

/// Resolve end bit and length from whichever of the two the row supplies.
fn resolve_extent(
    start: i64,
    end: Option<i64>,
    length: Option<i64>,
) -> Result<(i64, i64), DiagnosticKind> {
    let overflow = |field: &'static str, value: i64| DiagnosticKind::InvalidPosition {
        field,
        value: value.to_string(),
    };
    match (end, length) {
        (Some(end), Some(length)) => {
            let computed = span_length(start, end).ok_or_else(|| overflow("EndBit", end))?;
            if computed != length {
                return Err(DiagnosticKind::LengthMismatch {
                    computed,
                    declared: length,
                    start_bit: start,
                    end_bit: end,
                });
            }
            Ok((end, length))
        }
        (Some(end), None) => {
            let length = span_length(start, end).ok_or_else(|| overflow("EndBit", end))?;
            Ok((end, length))
        }
        (None, Some(length)) => {
            let end = start
                .checked_add(length)
                .and_then(|bit| bit.checked_sub(1))
                .ok_or_else(|| overflow("Length", length))?;
            Ok((end, length))
        }
        (None, None) => Err(DiagnosticKind::MissingEndOrLength),
    }
}

fn span_length(start: i64, end: i64) -> Option<i64> {
    end.checked_sub(start)?.checked_add(1)
}

fn narrow(value: i64, field: &'static str) -> Result<u32, DiagnosticKind> {
    u32::try_from(value).map_err(|_| DiagnosticKind::InvalidPosition {
        field,
        value: value.to_string(),
    })
}

/// Default values are advisory: a bad one is a warning and the row survives.
/// Out-of-range values are kept unclamped so the caller sees how they truncate;
/// only the low 64 bits can ever land in a frame.
fn parse_default(cell: &Cell, signal: &Signal, warnings: &mut Diagnostics) -> Option<u64> {
    let parsed = cell.integer()?;
    let Some(value) = parsed.ok().and_then(|value| u128::try_from(value).ok()) else {
        warnings.report(
            signal.row,
            DiagnosticKind::DefaultValueUnparseable {
                signal: signal.name.clone(),
                value: cell.to_string(),
            },
        );
        return None;
    };
    if value > u128::from(signal.max_value()) {
        warnings.report(
            signal.row,
            DiagnosticKind::DefaultValueOutOfRange {
                value,
                max: signal.max_value(),
                length: signal.length,
            },
        );
    }
    Some(value as u64)
}
