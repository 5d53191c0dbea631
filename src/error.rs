// src/error.rs
use std::io;
use thiserror::Error;

/// A header that could not be trusted.
///
/// Only the timestamp failure can be stepped over: the declared record length
/// still agrees with the beam count, so the next record boundary is known.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Record length mismatch: header declares {declared} bytes, beam layout needs {expected}")]
    RecordLengthMismatch { declared: u16, expected: u32 },

    #[error("Invalid ping timestamp ({reason})")]
    InvalidTimestamp { record_length: u16, reason: String },
}

impl DecodeError {
    /// Number of bytes to skip to reach the next record, if the record can be skipped.
    pub fn skip_length(&self) -> Option<u64> {
        match self {
            DecodeError::InvalidTimestamp { record_length, .. } => Some(*record_length as u64),
            DecodeError::RecordLengthMismatch { .. } => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum DeltaTError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Truncated record at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedRecord { offset: u64, needed: u64, available: u64 },

    #[error("No 83P data source found (looked for {0})")]
    SourceNotFound(String),

    #[error("Summary cache error: {0}")]
    Cache(#[from] serde_json::Error),

    #[error("Invalid timestamp pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Cannot encode record: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, DeltaTError>;
