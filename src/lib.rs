//! Typed, self-describing memory-mapped numeric arrays
//!
//! A raw memory-mapped file says nothing about the element type or shape
//! it was written with, which makes reopening it ambiguous. This crate
//! pairs a page-mapped data region with a small fixed header recording
//! element type, byte order, storage layout, and shape, so an array can be
//! reopened unambiguously by a later process without external metadata.
//!
//! Exactly one array lives in each file. Arrays may grow in place along a
//! single append axis; the header size is constant, so the data region
//! never moves and existing data is never rewritten. Element values are
//! exposed as a flat byte buffer plus metadata for a numeric-array library
//! to interpret; this crate performs no arithmetic itself.

pub mod error;
pub mod header;
pub mod mapping;
pub mod store;
pub mod types;

pub use error::{MemArrayError, Result};
pub use header::{FORMAT_VERSION, HEADER_SIZE, Header, MAGIC, MAX_NDIM};
pub use mapping::{MapMode, MappedRegion};
pub use store::ArrayStore;
pub use types::{ByteOrder, DType, Layout};
