/*!
 * Row-level validation findings, accumulated as values and handed back by each stage
 */

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Whether a finding drops the offending row or only flags it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Everything that can be wrong with a signal row or its placement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiagnosticKind {
    #[error("invalid message identifier (PID): {value}")]
    InvalidIdentifier { value: String },
    #[error("missing message name (PIDname) or signal name (SignalName)")]
    MissingName,
    #[error("missing start bit (StartBit)")]
    MissingStartBit,
    #[error("invalid {field} value: {value}")]
    InvalidPosition { field: &'static str, value: String },
    #[error(
        "length mismatch - computed length {computed}, declared length {declared} \
         (start bit {start_bit}, end bit {end_bit})"
    )]
    LengthMismatch {
        computed: i64,
        declared: i64,
        start_bit: i64,
        end_bit: i64,
    },
    #[error("missing end bit (EndBit) or length (Length)")]
    MissingEndOrLength,
    #[error("invalid length {length} (must be greater than 0)")]
    InvalidLength { length: i64 },
    #[error("end bit {end_bit} is before start bit {start_bit}")]
    EndBeforeStart { start_bit: i64, end_bit: i64 },
    #[error("signal '{signal}' is big-endian; only LSB-first signals are supported")]
    UnsupportedByteOrder { signal: String },
    #[error("signal '{signal}' overlaps signal '{other}' in message '{message}'")]
    OverlapDetected {
        message: String,
        signal: String,
        other: String,
    },
    #[error("cannot parse default value of signal '{signal}': {value}")]
    DefaultValueUnparseable { signal: String, value: String },
    #[error("default value {value} is out of range (max {max} for a {length}-bit signal)")]
    DefaultValueOutOfRange { value: u128, max: u64, length: u32 },
    #[error(
        "signal '{signal}' has {bits} bit(s) past byte 7 of message '{message}', \
         left out of the layout"
    )]
    BitsBeyondFrame {
        message: String,
        signal: String,
        bits: u32,
    },
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::DefaultValueUnparseable { .. }
            | DiagnosticKind::DefaultValueOutOfRange { .. }
            | DiagnosticKind::BitsBeyondFrame { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// A finding tied to the table row that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub row: usize,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(row: usize, kind: DiagnosticKind) -> Self {
        Diagnostic { row, kind }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.kind)
    }
}

impl Serialize for Diagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Diagnostic", 3)?;
        state.serialize_field("row", &self.row)?;
        state.serialize_field("severity", &self.severity())?;
        state.serialize_field("message", &self.kind.to_string())?;
        state.end()
    }
}

/// Ordered error and warning lists for one stage (or a whole run).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    /// File a finding under errors or warnings according to its severity.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Error => self.errors.push(diagnostic),
            Severity::Warning => self.warnings.push(diagnostic),
        }
    }

    pub fn report(&mut self, row: usize, kind: DiagnosticKind) {
        self.push(Diagnostic::new(row, kind));
    }

    /// Append another stage's findings after this one's.
    pub fn extend(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Put both lists in table row order. Stable, so findings for the same
    /// row keep their stage order.
    pub fn sort_by_row(&mut self) {
        self.errors.sort_by_key(|diagnostic| diagnostic.row);
        self.warnings.sort_by_key(|diagnostic| diagnostic.row);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_routes_by_severity() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.report(2, DiagnosticKind::MissingStartBit);
        diagnostics.report(
            3,
            DiagnosticKind::DefaultValueOutOfRange {
                value: 7,
                max: 3,
                length: 2,
            },
        );
        assert_eq!(diagnostics.errors.len(), 1);
        assert_eq!(diagnostics.warnings.len(), 1);
        assert_eq!(
            diagnostics.error_messages(),
            vec!["row 2: missing start bit (StartBit)".to_string()]
        );
        assert_eq!(
            diagnostics.warning_messages(),
            vec!["row 3: default value 7 is out of range (max 3 for a 2-bit signal)".to_string()]
        );
    }

    #[test]
    fn test_extend_keeps_stage_order() {
        let mut first = Diagnostics::default();
        first.report(5, DiagnosticKind::MissingEndOrLength);
        let mut second = Diagnostics::default();
        second.report(2, DiagnosticKind::MissingName);
        first.extend(second);
        let rows: Vec<usize> = first.errors.iter().map(|d| d.row).collect();
        assert_eq!(rows, vec![5, 2]);
    }

    #[test]
    fn test_sort_by_row_is_stable() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.report(4, DiagnosticKind::MissingEndOrLength);
        diagnostics.report(3, DiagnosticKind::MissingStartBit);
        diagnostics.report(4, DiagnosticKind::MissingName);
        diagnostics.sort_by_row();
        let kinds: Vec<(usize, &DiagnosticKind)> =
            diagnostics.errors.iter().map(|d| (d.row, &d.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (3, &DiagnosticKind::MissingStartBit),
                (4, &DiagnosticKind::MissingEndOrLength),
                (4, &DiagnosticKind::MissingName),
            ]
        );
    }

    #[test]
    fn test_serialize_diagnostic() {
        let diagnostic = Diagnostic::new(4, DiagnosticKind::InvalidLength { length: 0 });
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["row"], 4);
        assert_eq!(json["severity"], "error");
        assert_eq!(json["message"], "invalid length 0 (must be greater than 0)");
    }
}
