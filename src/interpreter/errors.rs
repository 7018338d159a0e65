//! Runtime error types for the execution engine
//!
//! Only stream-level failures abort a run. End-of-input is not an error:
//! an `Input` instruction that finds the stream exhausted stores the
//! sentinel 255 and execution continues.

use std::fmt;
use std::io;

/// Errors that can occur while executing a compiled program
#[derive(Debug)]
pub enum RuntimeError {
    /// The input stream failed mid-read (not end-of-stream).
    InputFailed(io::Error),
    /// The output stream rejected a byte.
    OutputFailed(io::Error),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::InputFailed(e) => write!(f, "Input stream failed: {}", e),
            RuntimeError::OutputFailed(e) => write!(f, "Output stream failed: {}", e),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::InputFailed(e) | RuntimeError::OutputFailed(e) => Some(e),
        }
    }
}
