/*!
 * LIN signal layout compiler.
 *
 * Reads a table of signal definitions (or a DBC database), validates every
 * row, groups signals into messages and lays each message out byte by byte
 * with reserved padding and a default byte image. The result is written as a
 * C configuration header or as JSON.
 */

pub mod byte_layout;
pub mod cfg_writer;
pub mod cli;
pub mod compiler;
pub mod dbc_import;
pub mod default_image;
pub mod diagnostics;
pub mod message_group;
pub mod raw_row;
pub mod signal;
pub mod signal_layout;
pub mod signal_table;

pub use cfg_writer::{compilation_to_header, compilation_to_json, HeaderOptions};
pub use cli::run_from_env;
pub use compiler::{compile, Compilation, CompileError};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use signal_table::{SignalTable, TableError};
