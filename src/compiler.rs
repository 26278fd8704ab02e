/*!
 * The whole pipeline: rows -> signals -> message groups -> byte layouts
 */

use std::fmt::Write;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::byte_layout::{build_layout, ByteLayout};
use crate::diagnostics::Diagnostics;
use crate::message_group::{group_signals, identifier_table, IdentifierEntry, MessageGroup};
use crate::signal::normalize_rows;
use crate::signal_table::SignalTable;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The table had no data rows at all. When rows exist but every one of
    /// them fails validation, the run still completes and reports the errors.
    #[error("no valid signal definitions found")]
    NoSignalsFound,
}

/// Everything the emitters need, plus the diagnostics gathered on the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Compilation {
    /// Message groups in encounter order, reserved diagnostic names included.
    pub messages: Vec<MessageGroup>,
    pub identifiers: Vec<IdentifierEntry>,
    /// One layout per non-synthetic message, in message order.
    pub layouts: Vec<ByteLayout>,
    pub diagnostics: Diagnostics,
    pub has_default_column: bool,
}

/// Run every stage over one table.
///
/// Each stage hands back its own diagnostics. They are merged and then put
/// in row order; findings on the same row keep their stage order.
pub fn compile(table: &SignalTable) -> Result<Compilation, CompileError> {
    let mut diagnostics = table.diagnostics.clone();

    let (signals, normalize_diagnostics) = normalize_rows(&table.rows);
    diagnostics.extend(normalize_diagnostics);
    debug!(
        rows = table.rows.len(),
        signals = signals.len(),
        "normalized signal rows"
    );
    if signals.is_empty() && diagnostics.errors.is_empty() {
        warn!(rows = table.rows.len(), "signal table has no data rows");
        return Err(CompileError::NoSignalsFound);
    }

    let messages = group_signals(signals);
    let identifiers = identifier_table(&messages);

    let mut layouts = Vec::with_capacity(messages.len());
    for group in messages.iter().filter(|group| !group.is_synthetic()) {
        let (layout, layout_diagnostics) = build_layout(group);
        diagnostics.extend(layout_diagnostics);
        layouts.push(layout);
    }

    diagnostics.sort_by_row();

    info!(
        messages = messages.len(),
        layouts = layouts.len(),
        errors = diagnostics.errors.len(),
        warnings = diagnostics.warnings.len(),
        "compiled signal table"
    );

    Ok(Compilation {
        messages,
        identifiers,
        layouts,
        diagnostics,
        has_default_column: table.has_default_column,
    })
}

impl Compilation {
    /// Consolidated, human-readable outcome of a run that produced `output`.
    pub fn report(&self, output: &Path) -> String {
        let mut s = format!("Generated LIN configuration: {}\n\n", output.display());
        if !self.diagnostics.errors.is_empty() {
            s.push_str("===== errors =====\n");
            for line in self.diagnostics.error_messages() {
                writeln!(s, "{line}").unwrap();
            }
            s.push_str("\nsome signals may be missing from the generated file\n");
        }
        if !self.diagnostics.warnings.is_empty() {
            s.push_str("===== warnings =====\n");
            for line in self.diagnostics.warning_messages() {
                writeln!(s, "{line}").unwrap();
            }
        }
        if self.diagnostics.is_empty() {
            s.push_str("all signals validated, no errors or warnings\n");
        }
        s
    }

    pub fn layout(&self, message: &str) -> Option<&ByteLayout> {
        self.layouts.iter().find(|layout| layout.message == message)
    }
}
