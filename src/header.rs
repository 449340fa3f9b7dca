//! Fixed-size header codec
//!
//! Every array file starts with an 80-byte preamble that makes the file
//! self-describing: element type, byte order, storage layout, and shape.
//! The header size is constant per format version, so the data region
//! always starts at [`HEADER_SIZE`] and never has to move when the array
//! grows.
//!
//! # Byte layout (version 1)
//!
//! ```text
//! offset  0..4    magic            "MARR"
//! offset  4       version          u8
//! offset  5       dtype code       u8
//! offset  6       byte-order tag   u8   (0 = little, 1 = big)
//! offset  7       element width    u8   (redundant, must match dtype)
//! offset  8       layout tag       u8   (0 = row-major, 1 = column-major)
//! offset  9       ndim             u8   (1..=8)
//! offset 10..16   reserved         zero
//! offset 16..80   shape[0..8]      u64 little-endian, zero beyond ndim
//! ```
//!
//! All scalar header fields are little-endian regardless of the byte-order
//! tag; the tag describes the data region only.

use crate::error::{MemArrayError, Result};
use crate::types::{ByteOrder, DType, Layout};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

/// Magic bytes identifying the format
pub const MAGIC: [u8; 4] = *b"MARR";

/// Current format revision; files declaring a newer version are rejected
pub const FORMAT_VERSION: u8 = 1;

/// Maximum number of dimensions a stored array may have
pub const MAX_NDIM: usize = 8;

/// Size of the preamble in bytes, constant for this format version
pub const HEADER_SIZE: usize = 80;

const SHAPE_OFFSET: usize = 16;

/// Decoded array file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    dtype: DType,
    byte_order: ByteOrder,
    layout: Layout,
    shape: Vec<u64>,
}

impl Header {
    /// Build a header, validating the shape
    ///
    /// A dimension may be zero only on the append axis, `ndim` must be in
    /// `1..=MAX_NDIM`, and the data-region length must fit in a `u64`.
    pub fn new(
        dtype: DType,
        byte_order: ByteOrder,
        layout: Layout,
        shape: &[u64],
    ) -> Result<Self> {
        let header = Self {
            dtype,
            byte_order,
            layout,
            shape: shape.to_vec(),
        };
        header.validate_shape()?;
        Ok(header)
    }

    /// Element type of the stored array
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Byte order of the stored elements
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Storage layout of the array
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Dimension lengths, outermost first
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Number of dimensions
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// The axis the array grows along, fixed by the layout
    pub fn append_axis(&self) -> usize {
        self.layout.append_axis(self.ndim())
    }

    /// Total number of elements
    pub fn element_count(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Byte length of the data region
    pub fn data_len(&self) -> u64 {
        self.element_count() * self.dtype.width() as u64
    }

    /// Number of records along the append axis
    pub fn record_count(&self) -> u64 {
        self.shape[self.append_axis()]
    }

    /// Byte length of one record (one slab of all non-append axes)
    ///
    /// A record is contiguous in both layouts because the append axis is
    /// the slowest-varying one.
    pub fn record_len(&self) -> u64 {
        let axis = self.append_axis();
        let elems: u64 = self
            .shape
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != axis)
            .map(|(_, &dim)| dim)
            .product();
        elems * self.dtype.width() as u64
    }

    /// Serialize into the fixed 80-byte preamble
    ///
    /// Field order and widths are fixed, shape slots beyond `ndim` are
    /// zero, so a given header always encodes to byte-identical output.
    pub fn encode(&self) -> Result<[u8; HEADER_SIZE]> {
        if self.ndim() > MAX_NDIM {
            return Err(MemArrayError::InvalidShape(format!(
                "{} dimensions exceed the supported maximum of {MAX_NDIM}",
                self.ndim()
            )));
        }

        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4] = FORMAT_VERSION;
        buf[5] = self.dtype.code();
        buf[6] = self.byte_order.tag();
        buf[7] = self.dtype.width() as u8;
        buf[8] = self.layout.tag();
        buf[9] = self.ndim() as u8;
        // bytes 10..16 reserved, zero

        for (i, &dim) in self.shape.iter().enumerate() {
            let offset = SHAPE_OFFSET + i * 8;
            buf[offset..offset + 8].copy_from_slice(&dim.to_le_bytes());
        }

        Ok(buf)
    }

    /// Decode the fixed-size preamble from the start of `bytes`
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(MemArrayError::MalformedHeader(format!(
                "{} bytes is shorter than the {HEADER_SIZE}-byte preamble",
                bytes.len()
            )));
        }

        let mut reader = Cursor::new(bytes);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(MemArrayError::InvalidMagic {
                expected: MAGIC,
                actual: magic,
            });
        }

        let version = reader.read_u8()?;
        if version > FORMAT_VERSION {
            return Err(MemArrayError::UnsupportedVersion(version));
        }
        if version == 0 {
            return Err(MemArrayError::MalformedHeader(
                "version 0 is not a valid format revision".into(),
            ));
        }

        let dtype_code = reader.read_u8()?;
        let dtype = DType::from_code(dtype_code).ok_or_else(|| {
            MemArrayError::MalformedHeader(format!("unknown dtype code {dtype_code:#04x}"))
        })?;

        let order_tag = reader.read_u8()?;
        let byte_order = ByteOrder::from_tag(order_tag).ok_or_else(|| {
            MemArrayError::MalformedHeader(format!("unknown byte-order tag {order_tag}"))
        })?;

        let width = reader.read_u8()?;
        if width as usize != dtype.width() {
            return Err(MemArrayError::MalformedHeader(format!(
                "recorded element width {width} does not match {dtype} (width {})",
                dtype.width()
            )));
        }

        let layout_tag = reader.read_u8()?;
        let layout = Layout::from_tag(layout_tag).ok_or_else(|| {
            MemArrayError::MalformedHeader(format!("unknown layout tag {layout_tag}"))
        })?;

        let ndim = reader.read_u8()? as usize;
        if ndim == 0 || ndim > MAX_NDIM {
            return Err(MemArrayError::MalformedHeader(format!(
                "ndim {ndim} outside supported range 1..={MAX_NDIM}"
            )));
        }

        reader.set_position(SHAPE_OFFSET as u64);
        let mut shape = Vec::with_capacity(ndim);
        for _ in 0..ndim {
            shape.push(reader.read_u64::<LittleEndian>()?);
        }

        let header = Self {
            dtype,
            byte_order,
            layout,
            shape,
        };
        header
            .validate_shape()
            .map_err(|e| MemArrayError::MalformedHeader(e.to_string()))?;
        Ok(header)
    }

    fn validate_shape(&self) -> Result<()> {
        let ndim = self.ndim();
        if ndim == 0 || ndim > MAX_NDIM {
            return Err(MemArrayError::InvalidShape(format!(
                "ndim {ndim} outside supported range 1..={MAX_NDIM}"
            )));
        }

        let axis = self.append_axis();
        for (i, &dim) in self.shape.iter().enumerate() {
            if dim == 0 && i != axis {
                return Err(MemArrayError::InvalidShape(format!(
                    "dimension {i} is zero but only the append axis ({axis}) may be zero"
                )));
            }
        }

        let mut elements: u64 = 1;
        for &dim in &self.shape {
            elements = elements.checked_mul(dim).ok_or_else(|| {
                MemArrayError::InvalidShape("element count overflows u64".into())
            })?;
        }
        elements
            .checked_mul(self.dtype.width() as u64)
            .and_then(|len| len.checked_add(HEADER_SIZE as u64))
            .ok_or_else(|| MemArrayError::InvalidShape("byte length overflows u64".into()))?;

        Ok(())
    }
}
