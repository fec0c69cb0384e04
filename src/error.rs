//! Error types for the map and its INI consumer.

use std::io;
use thiserror::Error;

/// Failures reported by `ChainMap` construction and insertion.
///
/// Every failure leaves the map exactly as it was before the call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// Growing would overflow `usize` or pass the configured bucket limit.
    #[error("cannot grow past {buckets} buckets")]
    CapacityOverflow { buckets: usize },

    /// The allocator refused a reservation.
    #[error("allocation failed while reserving {slots} slots")]
    AllocationFailed { slots: usize },
}

/// Errors raised while reading an INI file.
#[derive(Error, Debug)]
pub enum IniError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("expected closing ']' on line {line}")]
    MissingSectionEnd { line: usize },

    #[error("expected key=value notation on line {line}")]
    ExpectedKeyValue { line: usize },

    #[error("key=value mapping without valid section on line {line}")]
    KeyOutsideSection { line: usize },

    #[error("empty key on line {line}")]
    EmptyKey { line: usize },

    #[error("map error: {0}")]
    Map(#[from] MapError),
}

impl IniError {
    /// 1-based line the error was found on, if it came from the parser.
    pub fn line(&self) -> Option<usize> {
        match self {
            IniError::MissingSectionEnd { line }
            | IniError::ExpectedKeyValue { line }
            | IniError::KeyOutsideSection { line }
            | IniError::EmptyKey { line } => Some(*line),
            IniError::Io(_) | IniError::Map(_) => None,
        }
    }
}
