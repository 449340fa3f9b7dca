//! Error types for memory-mapped array operations

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemArrayError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid magic {actual:02x?}, expected {expected:02x?}")]
    InvalidMagic { expected: [u8; 4], actual: [u8; 4] },

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("file length {actual} does not match header-declared length {expected}")]
    IntegrityMismatch { expected: u64, actual: u64 },

    #[error("invalid shape: {0}")]
    InvalidShape(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("record range {start}..{end} out of bounds for {len} records")]
    OutOfRange { start: u64, end: u64, len: u64 },

    #[error("store is read-only")]
    ReadOnly,

    #[error("memory map failed: {0}")]
    Map(#[source] io::Error),

    #[error("store is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, MemArrayError>;
