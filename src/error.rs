//! Error types backing the error-kind table in spec.md §7. The parser never
//! escalates errors; the `Terminal` API returns `Result` only on geometric
//! operations (`resize`) and explicit transport writes, matching the
//! teacher's narrow, hand-rolled `Result` usage rather than pulling in
//! `thiserror`/`anyhow`.

use std::fmt;

#[derive(Debug)]
pub enum TerminalError {
    /// `resize` to a degenerate geometry (0 columns or 0 rows).
    ResizeRejected { columns: u16, rows: u16 },
    /// The reply sink or transport write-sink failed.
    TransportWriteFailed(std::io::Error),
}

impl fmt::Display for TerminalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalError::ResizeRejected { columns, rows } => {
                write!(f, "rejected resize to {columns}x{rows}")
            }
            TerminalError::TransportWriteFailed(e) => write!(f, "transport write failed: {e}"),
        }
    }
}

impl std::error::Error for TerminalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TerminalError::TransportWriteFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TerminalError {
    fn from(e: std::io::Error) -> Self {
        TerminalError::TransportWriteFailed(e)
    }
}

pub type Result<T> = std::result::Result<T, TerminalError>;
