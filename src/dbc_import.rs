/*!
 * Imports signal definitions from a DBC database as table rows
 */

use std::path::Path;

use anyhow::{anyhow, Context};
use tracing::debug;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::raw_row::{Cell, RawRow};
use crate::signal_table::SignalTable;

pub fn load_dbc(dbc_path: &Path) -> anyhow::Result<can_dbc::DBC> {
    let buffer = std::fs::read(dbc_path)
        .with_context(|| format!("failed to read DBC file {}", dbc_path.display()))?;
    can_dbc::DBC::from_slice(&buffer)
        .map_err(|e| anyhow!("failed to parse DBC file {}: {:?}", dbc_path.display(), e))
}

/// Flatten every message's signals into rows, numbered as if they were a table
/// with a header (first signal is row 2).
///
/// Big-endian signals cannot be expressed as an LSB-first bit range; they are
/// reported and left out. DBC signals carry no default value.
pub fn dbc_to_table(dbc: &can_dbc::DBC) -> SignalTable {
    let mut rows = Vec::new();
    let mut diagnostics = Diagnostics::default();
    let mut row = 1;

    for message in dbc.messages() {
        for signal in message.signals() {
            row += 1;
            if let can_dbc::ByteOrder::BigEndian = signal.byte_order() {
                diagnostics.report(
                    row,
                    DiagnosticKind::UnsupportedByteOrder {
                        signal: signal.name().clone(),
                    },
                );
                continue;
            }
            rows.push(RawRow {
                row,
                message_id: Cell::Int(i64::from(message.message_id().raw())),
                message_name: Cell::Text(message.message_name().clone()),
                signal_name: Cell::Text(signal.name().clone()),
                start_bit: Cell::Int(signal.start_bit as i64),
                end_bit: Cell::Missing,
                length: Cell::Int(signal.signal_size as i64),
                default_value: Cell::Missing,
            });
        }
    }
    debug!(
        messages = dbc.messages().len(),
        rows = rows.len(),
        skipped = diagnostics.errors.len(),
        "imported DBC signals"
    );

    SignalTable {
        rows,
        has_default_column: false,
        diagnostics,
    }
}

pub fn table_from_dbc(dbc_path: &Path) -> anyhow::Result<SignalTable> {
    let dbc = load_dbc(dbc_path)?;
    Ok(dbc_to_table(&dbc))
}
